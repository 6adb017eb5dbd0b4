//! Activity log entries

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Log entry joined with the actor's display name
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ActivityEntry {
    pub id: i64,
    #[serde(rename = "aktivitas")]
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Null for system actions or users that no longer exist
    pub actor: Option<String>,
}
