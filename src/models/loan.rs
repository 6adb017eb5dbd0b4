//! Loan (borrow) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{enums::LoanStatus, LooseInt};
use crate::error::{AppError, AppResult};

/// Loan row as stored
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrowed_on: NaiveDate,
    pub due_on: NaiveDate,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}

/// Loan joined with borrower and book names, for listings
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LoanRecord {
    pub id: i32,
    pub user_id: i32,
    #[serde(rename = "buku_id")]
    pub book_id: i32,
    #[serde(rename = "tanggal_pinjam")]
    pub borrowed_on: NaiveDate,
    #[serde(rename = "tanggal_kembali")]
    pub due_on: NaiveDate,
    pub status: LoanStatus,
    #[serde(rename = "peminjam")]
    pub borrower: String,
    #[serde(rename = "buku")]
    pub book_title: String,
}

/// Create loan request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<LooseInt>,
    #[schema(value_type = Option<i64>)]
    pub buku_id: Option<LooseInt>,
    /// Due date (YYYY-MM-DD)
    pub due_date: Option<String>,
    /// Borrow date (YYYY-MM-DD), defaults to today
    pub tanggal_pinjam: Option<String>,
}

/// Validated checkout
#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    pub user_id: i32,
    pub book_id: i32,
    pub borrowed_on: Option<NaiveDate>,
    pub due_on: NaiveDate,
}

impl TryFrom<CreateLoanRequest> for Checkout {
    type Error = AppError;

    fn try_from(request: CreateLoanRequest) -> AppResult<Self> {
        let user_id = required_id(request.user_id.as_ref(), "user_id", "Member must be selected")?;
        let book_id = required_id(request.buku_id.as_ref(), "buku_id", "Book must be selected")?;
        let due_on = parse_date(request.due_date.as_deref(), "due_date", "Due date is required")?;
        let borrowed_on = match request.tanggal_pinjam.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(parse_date(
                Some(raw),
                "tanggal_pinjam",
                "Borrow date is invalid",
            )?),
            _ => None,
        };

        Ok(Checkout {
            user_id,
            book_id,
            borrowed_on,
            due_on,
        })
    }
}

/// PATCH body for a loan
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoanPatchRequest {
    /// `return` or `extend`
    pub action: Option<String>,
    /// New due date for `extend` (YYYY-MM-DD)
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Return,
    Extend(NaiveDate),
}

impl TryFrom<LoanPatchRequest> for LoanAction {
    type Error = AppError;

    fn try_from(request: LoanPatchRequest) -> AppResult<Self> {
        match request.action.as_deref() {
            Some("return") => Ok(LoanAction::Return),
            Some("extend") => Ok(LoanAction::Extend(parse_date(
                request.due_date.as_deref(),
                "due_date",
                "New due date is required",
            )?)),
            _ => Err(AppError::missing_field("action", "Unknown action")),
        }
    }
}

fn required_id(value: Option<&LooseInt>, field: &str, message: &str) -> AppResult<i32> {
    value
        .filter(|v| !v.is_blank())
        .map(LooseInt::value)
        .filter(|id| *id > 0 && *id <= i32::MAX as i64)
        .map(|id| id as i32)
        .ok_or_else(|| AppError::missing_field(field, message))
}

/// Parse a `YYYY-MM-DD` date; missing, empty and malformed values all fail
pub(crate) fn parse_date(value: Option<&str>, field: &str, message: &str) -> AppResult<NaiveDate> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::missing_field(field, message))?;

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::missing_field(field, format!("Invalid date: {}", raw)))
}
