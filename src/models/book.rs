//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::LooseInt;
use crate::error::{AppError, AppResult};

/// Book row. `stock_count` is the number of copies currently on the shelf.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    #[serde(rename = "judul")]
    pub title: String,
    #[serde(rename = "pengarang")]
    pub author: String,
    #[serde(rename = "penerbit")]
    pub publisher: Option<String>,
    #[serde(rename = "tahun_terbit")]
    pub year: Option<String>,
    pub isbn: Option<String>,
    #[serde(rename = "kategori")]
    pub category: String,
    #[serde(rename = "jumlah_stok")]
    pub stock_count: i32,
    #[serde(rename = "lokasi_rak")]
    pub shelf_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Publication year as sent by clients: a number or free text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YearInput {
    Number(i64),
    Text(String),
}

impl YearInput {
    pub fn sanitized(&self) -> Option<String> {
        match self {
            YearInput::Number(n) => sanitize_year(&n.to_string()),
            YearInput::Text(s) => sanitize_year(s),
        }
    }
}

/// Keep only the digits; accept the result if exactly four remain.
pub fn sanitize_year(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 4 {
        Some(digits)
    } else {
        None
    }
}

/// Create / update book request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(
        required(message = "Title is required"),
        length(min = 1, message = "Title is required")
    )]
    pub judul: Option<String>,
    #[validate(
        required(message = "Author is required"),
        length(min = 1, message = "Author is required")
    )]
    pub pengarang: Option<String>,
    pub penerbit: Option<String>,
    #[schema(value_type = Option<String>)]
    pub tahun_terbit: Option<YearInput>,
    pub isbn: Option<String>,
    #[validate(
        required(message = "Category is required"),
        length(min = 1, message = "Category is required")
    )]
    pub kategori: Option<String>,
    #[validate(required(message = "Stock is required"))]
    #[schema(value_type = Option<i64>)]
    pub jumlah_stok: Option<LooseInt>,
    pub lokasi_rak: Option<String>,
}

/// Validated book fields ready for storage
#[derive(Debug, Clone, PartialEq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub isbn: Option<String>,
    pub category: String,
    pub stock_count: i32,
    pub shelf_location: Option<String>,
}

impl TryFrom<BookInput> for BookFields {
    type Error = AppError;

    fn try_from(input: BookInput) -> AppResult<Self> {
        input.validate()?;

        let stock = input
            .jumlah_stok
            .as_ref()
            .filter(|s| !s.is_blank())
            .ok_or_else(|| AppError::missing_field("jumlah_stok", "Stock is required"))?
            .value();

        Ok(BookFields {
            title: input.judul.unwrap_or_default(),
            author: input.pengarang.unwrap_or_default(),
            publisher: input.penerbit,
            year: input.tahun_terbit.as_ref().and_then(YearInput::sanitized),
            isbn: input.isbn,
            category: input.kategori.unwrap_or_default(),
            stock_count: stock.clamp(0, i32::MAX as i64) as i32,
            shelf_location: input.lokasi_rak,
        })
    }
}

/// Stock-status filter for book listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockFilter {
    /// stock > 0
    Available,
    /// stock = 0
    Empty,
}

impl StockFilter {
    /// Unknown values mean "no filter"
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(StockFilter::Available),
            "empty" => Some(StockFilter::Empty),
            _ => None,
        }
    }
}

/// Page window derived from `page` / `limit` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 100;

    /// `page` ≥ 1, `limit` clamped to [1, 100]. Unparseable values count as 0
    /// and are clamped like any other out-of-range value.
    pub fn from_params(page: Option<&str>, limit: Option<&str>, default_limit: i64) -> Self {
        let parse = |v: &str| v.trim().parse::<i64>().unwrap_or(0);
        let page = page.map(parse).unwrap_or(1).max(1);
        let limit = limit
            .map(parse)
            .unwrap_or(default_limit)
            .clamp(1, Self::MAX_LIMIT);

        Pagination {
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

/// Book listing filter
#[derive(Debug, Clone)]
pub struct BookFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub stock: Option<StockFilter>,
    pub pagination: Pagination,
}

impl BookFilter {
    pub const DEFAULT_LIMIT: i64 = 30;
}
