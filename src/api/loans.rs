//! Loan endpoints (`entity=loans`)

use axum::{
    http::{Method, StatusCode},
    response::Response,
};

use crate::{
    error::{AppError, AppResult},
    models::loan::LoanAction,
    AppState,
};

use super::{with_data, with_id, with_message, ApiRequest};

pub async fn handle(state: &AppState, request: ApiRequest) -> AppResult<Response> {
    let identity = request.identity(state).await?;
    identity.require_staff("Loans are managed by the head librarian or staff")?;

    match request.method {
        Method::GET => Ok(with_data(state.services.loans.list().await?)),
        Method::POST => {
            let id = state
                .services
                .loans
                .checkout(&identity, request.json()?)
                .await?;
            Ok(with_id(StatusCode::CREATED, "Loan recorded", id))
        }
        Method::PATCH => {
            let id = request.id("Loan id is required")?;
            let action = state
                .services
                .loans
                .apply(&identity, id, request.json()?)
                .await?;
            Ok(match action {
                LoanAction::Return => with_message("Loan marked as returned"),
                LoanAction::Extend(_) => with_message("Due date extended"),
            })
        }
        Method::DELETE => {
            let id = request.id("Loan id is required")?;
            state.services.loans.delete(&identity, id).await?;
            Ok(with_message("Loan deleted"))
        }
        _ => Err(AppError::MethodNotSupported),
    }
}
