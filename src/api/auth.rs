//! Authentication endpoints (`entity=auth`)

use axum::{
    http::Method,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    config::SessionConfig,
    error::{AppError, AppResult},
    models::user::Identity,
    AppState,
};

use super::{with_message, ApiRequest};

/// Login request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username or email
    pub credential: Option<String>,
    /// Accepted when `credential` is absent
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub user: Identity,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub authenticated: bool,
    pub user: Option<Identity>,
}

fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookie)
        .build()
}

fn expired_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), String::new()))
        .path("/")
        .build()
}

pub async fn handle(state: &AppState, request: ApiRequest, jar: CookieJar) -> AppResult<Response> {
    let action = request.query.action.clone().unwrap_or_default();

    match (&request.method, action.as_str()) {
        (&Method::POST, "login") => login(state, &request, jar).await,
        (&Method::DELETE, "logout") => logout(state, &request, jar).await,
        (&Method::GET, "me") => me(state, &request).await,
        _ => Err(AppError::NotFound("Unknown auth endpoint".to_string())),
    }
}

async fn login(state: &AppState, request: &ApiRequest, jar: CookieJar) -> AppResult<Response> {
    let payload: LoginRequest = request.json()?;
    let identifier = payload.credential.or(payload.email).unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let (token, user) = match state.services.auth.login(&identifier, &password).await {
        Ok(session) => session,
        Err(e) => {
            if matches!(e, AppError::Authentication(_)) {
                tracing::warn!(identifier = identifier.trim(), "Rejected login");
            }
            return Err(e);
        }
    };

    // A new login replaces whatever session the browser held before
    if let Some(previous) = request.session_token.as_deref() {
        state.services.sessions.destroy(previous).await?;
    }

    let jar = jar.add(session_cookie(&state.config.session, token));
    let body = LoginResponse {
        message: "Login successful".to_string(),
        user,
    };
    Ok((jar, Json(body)).into_response())
}

async fn logout(state: &AppState, request: &ApiRequest, jar: CookieJar) -> AppResult<Response> {
    state
        .services
        .auth
        .logout(request.session_token.as_deref())
        .await?;

    let jar = jar.remove(expired_cookie(&state.config.session));
    Ok((jar, with_message("Logout successful")).into_response())
}

async fn me(state: &AppState, request: &ApiRequest) -> AppResult<Response> {
    let user = state
        .services
        .auth
        .current(request.session_token.as_deref())
        .await?;

    Ok(Json(MeResponse {
        authenticated: user.is_some(),
        user,
    })
    .into_response())
}
