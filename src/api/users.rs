//! User endpoints (`entity=users`)

use axum::{
    http::{Method, StatusCode},
    response::Response,
};

use crate::{
    error::{AppError, AppResult},
    AppState,
};

use super::{with_data, with_id, with_message, ApiRequest};

pub async fn handle(state: &AppState, request: ApiRequest) -> AppResult<Response> {
    let identity = request.identity(state).await?;

    match request.method {
        Method::GET if request.query.scope.as_deref() == Some("members") => {
            identity.require_staff("Access to the member list is denied")?;
            Ok(with_data(state.services.users.list_members().await?))
        }
        Method::GET => {
            identity.require_head("Only the head librarian can list all users")?;
            Ok(with_data(state.services.users.list_all().await?))
        }
        Method::POST => {
            identity.require_staff("You are not allowed to create accounts")?;
            let id = state
                .services
                .users
                .create(&identity, request.json()?)
                .await?;
            Ok(with_id(StatusCode::CREATED, "Account created", id))
        }
        Method::PUT | Method::PATCH => {
            identity.require_head("Only the head librarian can update users")?;
            let id = request.id("User id is required")?;
            state
                .services
                .users
                .update(&identity, id, request.json()?)
                .await?;
            Ok(with_message("User updated"))
        }
        Method::DELETE => {
            identity.require_head("Only the head librarian can delete users")?;
            let id = request.id("User id is required")?;
            state.services.users.delete(&identity, id).await?;
            Ok(with_message("User deleted"))
        }
        _ => Err(AppError::MethodNotSupported),
    }
}
