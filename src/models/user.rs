//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::Role;
use crate::error::{AppError, AppResult};

/// Row used by the login path; the only place the password digest is read
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    /// Hashed password (argon2)
    pub password: String,
}

/// Authenticated identity bound to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
}

impl From<&UserCredentials> for Identity {
    fn from(user: &UserCredentials) -> Self {
        Identity {
            id: user.id,
            name: user.full_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl Identity {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn is_head(&self) -> bool {
        self.role.is_head()
    }

    /// Require head librarian or staff
    pub fn require_staff(&self, message: &str) -> AppResult<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(message.to_string()))
        }
    }

    /// Require head librarian
    pub fn require_head(&self, message: &str) -> AppResult<()> {
        if self.is_head() {
            Ok(())
        } else {
            Err(AppError::Authorization(message.to_string()))
        }
    }
}

/// User as listed to staff (never carries the password digest)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    #[serde(rename = "nama_lengkap")]
    pub full_name: String,
    pub email: Option<String>,
    #[serde(rename = "no_telp")]
    pub phone: Option<String>,
    #[serde(rename = "alamat")]
    pub address: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Create user request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(
        required(message = "Username is required"),
        length(min = 1, message = "Username is required")
    )]
    pub username: Option<String>,
    #[validate(
        required(message = "Full name is required"),
        length(min = 1, message = "Full name is required")
    )]
    pub nama_lengkap: Option<String>,
    #[validate(
        required(message = "Password is required"),
        length(min = 1, message = "Password is required")
    )]
    pub password: Option<String>,
    /// Blank means no address; the format is checked when one is given
    pub email: Option<String>,
    pub no_telp: Option<String>,
    pub alamat: Option<String>,
    /// Only honoured when the actor is the head librarian
    pub role: Option<String>,
}

/// Validated user ready for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
}

/// Update user request. Absent or empty fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub nama_lengkap: Option<String>,
    pub email: Option<String>,
    pub no_telp: Option<String>,
    pub alamat: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// Column changes derived from an `UpdateUser`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        *self == UserChanges::default()
    }
}

/// Treat empty strings as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse a client-supplied role name
pub(crate) fn parse_role(value: &str) -> AppResult<Role> {
    value
        .parse()
        .map_err(|e: String| AppError::missing_field("role", e))
}
