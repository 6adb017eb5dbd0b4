//! HTTP surface.
//!
//! Everything is served from a single `/api` endpoint. The `entity` query
//! parameter selects the handler, the HTTP method (and for `auth` the
//! `action` parameter) selects the operation.

pub mod auth;
pub mod books;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod loans;
pub mod logs;
pub mod openapi;
pub mod users;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::user::Identity,
    AppState,
};

/// Query parameters understood by `/api`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApiQuery {
    /// auth, categories, books, users, loans, dashboard or logs
    pub entity: Option<String>,
    /// login, logout or me (auth only)
    pub action: Option<String>,
    /// Target record for updates and deletes
    pub id: Option<String>,
    /// `members` restricts the user listing to members
    pub scope: Option<String>,
    /// Book search text
    pub q: Option<String>,
    /// Exact category name
    pub kategori: Option<String>,
    /// `available` or `empty`
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// One decoded call to `/api`
pub struct ApiRequest {
    pub method: Method,
    pub query: ApiQuery,
    pub session_token: Option<String>,
    body: Bytes,
}

impl ApiRequest {
    pub fn new(method: Method, query: ApiQuery, session_token: Option<String>, body: Bytes) -> Self {
        Self {
            method,
            query,
            session_token,
            body,
        }
    }

    /// Decode the JSON body. An empty body reads as `{}`.
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        let parsed = if self.body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_slice(b"{}")
        } else {
            serde_json::from_slice(&self.body)
        };

        parsed.map_err(|e| {
            tracing::debug!("Rejected request body: {}", e);
            AppError::validation("Payload must be valid JSON")
        })
    }

    /// Positive integer `id` query parameter
    pub fn id(&self, message: &str) -> AppResult<i32> {
        self.query
            .id
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::missing_field("id", message))
    }

    /// Identity of the caller, or 401
    pub async fn identity(&self, state: &AppState) -> AppResult<Identity> {
        state
            .services
            .auth
            .current(self.session_token.as_deref())
            .await?
            .ok_or_else(|| {
                AppError::Authentication("Session expired, please log in again".to_string())
            })
    }
}

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Id of a created or updated record
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordId {
    pub id: i32,
}

/// `{data}` with 200
pub fn with_data<T: Serialize>(data: T) -> Response {
    Json(ApiResponse {
        message: None,
        data: Some(data),
    })
    .into_response()
}

/// `{message}` with 200
pub fn with_message(message: &str) -> Response {
    Json(ApiResponse::<()> {
        message: Some(message.to_string()),
        data: None,
    })
    .into_response()
}

/// `{message, data: {id}}` with the given status
pub fn with_id(status: StatusCode, message: &str, id: i32) -> Response {
    (
        status,
        Json(ApiResponse {
            message: Some(message.to_string()),
            data: Some(RecordId { id }),
        }),
    )
        .into_response()
}

/// Library back office API
///
/// The HTTP method selects the operation: GET lists, POST creates,
/// PUT/PATCH update (`id` required), DELETE removes (`id` required).
/// Authentication uses the session cookie set by `entity=auth&action=login`.
#[utoipa::path(
    get,
    path = "/api",
    tag = "api",
    params(ApiQuery),
    responses(
        (status = 200, description = "Operation succeeded"),
        (status = 201, description = "Record created", body = RecordId),
        (status = 204, description = "OPTIONS preflight"),
        (status = 400, description = "Missing entity", body = crate::error::ErrorResponse),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse),
        (status = 403, description = "Role not allowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown entity or record", body = crate::error::ErrorResponse),
        (status = 405, description = "Method not supported", body = crate::error::ErrorResponse),
        (status = 409, description = "Conflicting state", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid input or out of stock", body = crate::error::ErrorResponse)
    )
)]
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<ApiQuery>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<Response> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let entity = query
        .entity
        .clone()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("The entity parameter is required".to_string()))?;

    let session_token = jar
        .get(&state.config.session.cookie_name)
        .map(|cookie| cookie.value().to_string());
    let request = ApiRequest::new(method, query, session_token, body);

    match entity.trim() {
        "auth" => auth::handle(&state, request, jar).await,
        "categories" => categories::handle(&state, request).await,
        "books" => books::handle(&state, request).await,
        "users" => users::handle(&state, request).await,
        "loans" => loans::handle(&state, request).await,
        "dashboard" => dashboard::handle(&state, request).await,
        "logs" => logs::handle(&state, request).await,
        _ => Err(AppError::NotFound("Endpoint not found".to_string())),
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api", any(dispatch))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
