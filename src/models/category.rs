//! Book category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "deskripsi")]
    pub description: Option<String>,
}

/// Create / update category request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[validate(
        required(message = "Category name is required"),
        length(min = 1, message = "Category name is required")
    )]
    pub nama: Option<String>,
    pub deskripsi: Option<String>,
}
