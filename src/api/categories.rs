//! Category endpoints (`entity=categories`)

use axum::{
    http::{Method, StatusCode},
    response::Response,
};

use crate::{error::{AppError, AppResult}, AppState};

use super::{with_data, with_id, with_message, ApiRequest};

pub async fn handle(state: &AppState, request: ApiRequest) -> AppResult<Response> {
    let identity = request.identity(state).await?;

    if request.method == Method::GET {
        let categories = state.services.catalog.list_categories().await?;
        return Ok(with_data(categories));
    }

    identity.require_staff("Only the head librarian or staff can manage categories")?;

    match request.method {
        Method::POST => {
            let id = state
                .services
                .catalog
                .create_category(&identity, request.json()?)
                .await?;
            Ok(with_id(StatusCode::CREATED, "Category added", id))
        }
        Method::PUT | Method::PATCH => {
            let id = request.id("Category id is required")?;
            state
                .services
                .catalog
                .update_category(&identity, id, request.json()?)
                .await?;
            Ok(with_id(StatusCode::OK, "Category updated", id))
        }
        Method::DELETE => {
            let id = request.id("Category id is required")?;
            state.services.catalog.delete_category(&identity, id).await?;
            Ok(with_message("Category deleted"))
        }
        _ => Err(AppError::MethodNotSupported),
    }
}
