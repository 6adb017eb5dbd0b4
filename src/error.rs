//! Error types for the Smart Library server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Out of stock: {0}")]
    OutOfStock(String),

    #[error("Method not supported")]
    MethodNotSupported,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    Session(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure without a specific field
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Validation failure pinned to a request field
    pub fn missing_field(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::OutOfStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Session(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub context: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, context) = match self {
            AppError::Validation { message, field } => {
                (message, field.map(|field| json!({ "field": field })))
            }
            AppError::Conflict(msg) | AppError::OutOfStock(msg) => {
                tracing::warn!("Request refused: {}", msg);
                (msg, None)
            }
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg) => (msg, None),
            AppError::MethodNotSupported => ("Method not supported".to_string(), None),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("Database error".to_string(), None)
            }
            AppError::Session(e) => {
                tracing::error!("Session store error: {:?}", e);
                ("Session store unavailable".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
        };

        (status, Json(ErrorResponse { message, context })).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| (field.to_string(), errs))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                AppError::missing_field(field, message)
            }
            None => AppError::validation("Invalid payload"),
        }
    }
}

/// Translates storage constraint violations into domain errors so raw
/// database errors never reach clients for expected conflicts.
pub trait ConstraintExt<T> {
    /// Map a unique-key violation to `Conflict(message)`
    fn on_unique_violation(self, message: &str) -> AppResult<T>;
    /// Map a foreign-key violation to `err`
    fn on_foreign_key_violation(self, err: impl FnOnce() -> AppError) -> AppResult<T>;
}

impl<T> ConstraintExt<T> for Result<T, sqlx::Error> {
    fn on_unique_violation(self, message: &str) -> AppResult<T> {
        self.map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::Conflict(message.to_string());
                }
            }
            AppError::Database(e)
        })
    }

    fn on_foreign_key_violation(self, err: impl FnOnce() -> AppError) -> AppResult<T> {
        self.map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_foreign_key_violation() {
                    return err();
                }
            }
            AppError::Database(e)
        })
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
