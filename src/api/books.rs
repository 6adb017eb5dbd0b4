//! Book endpoints (`entity=books`)

use axum::{
    http::{Method, StatusCode},
    response::Response,
};

use crate::{
    error::{AppError, AppResult},
    models::book::{BookFilter, Pagination, StockFilter},
    AppState,
};

use super::{with_data, with_id, with_message, ApiQuery, ApiRequest};

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Build the catalog filter from the query string
pub fn book_filter(query: &ApiQuery) -> BookFilter {
    BookFilter {
        search: trimmed(query.q.as_deref()),
        category: trimmed(query.kategori.as_deref()),
        stock: query.status.as_deref().and_then(StockFilter::parse),
        pagination: Pagination::from_params(
            query.page.as_deref(),
            query.limit.as_deref(),
            BookFilter::DEFAULT_LIMIT,
        ),
    }
}

pub async fn handle(state: &AppState, request: ApiRequest) -> AppResult<Response> {
    let identity = request.identity(state).await?;

    if request.method == Method::GET {
        let books = state
            .services
            .catalog
            .search_books(&book_filter(&request.query))
            .await?;
        return Ok(with_data(books));
    }

    identity.require_staff("Only the head librarian or staff can manage books")?;

    match request.method {
        Method::POST => {
            let id = state
                .services
                .catalog
                .create_book(&identity, request.json()?)
                .await?;
            Ok(with_id(StatusCode::CREATED, "Book added", id))
        }
        Method::PUT | Method::PATCH => {
            let id = request.id("Book id is required")?;
            state
                .services
                .catalog
                .update_book(&identity, id, request.json()?)
                .await?;
            Ok(with_id(StatusCode::OK, "Book updated", id))
        }
        Method::DELETE => {
            let id = request.id("Book id is required")?;
            state.services.catalog.delete_book(&identity, id).await?;
            Ok(with_message("Book deleted"))
        }
        _ => Err(AppError::MethodNotSupported),
    }
}
