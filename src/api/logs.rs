//! Activity log endpoint (`entity=logs`)

use axum::{http::Method, response::Response};

use crate::{
    error::{AppError, AppResult},
    AppState,
};

use super::{with_data, ApiRequest};

pub async fn handle(state: &AppState, request: ApiRequest) -> AppResult<Response> {
    let identity = request.identity(state).await?;
    identity.require_staff("The activity log is only for the head librarian or staff")?;

    if request.method != Method::GET {
        return Err(AppError::MethodNotSupported);
    }
    Ok(with_data(state.services.activity.latest().await?))
}
