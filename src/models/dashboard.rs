//! Dashboard aggregates

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::LoanStatus;

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DashboardTotals {
    pub books: i64,
    /// Sum of stock across all books
    pub available_books: i64,
    pub members: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RecentLoan {
    pub id: i32,
    #[serde(rename = "judul")]
    pub title: String,
    #[serde(rename = "peminjam")]
    pub borrower: String,
    pub status: LoanStatus,
    #[serde(rename = "tanggal_kembali")]
    pub due_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct OverdueLoan {
    pub id: i32,
    #[serde(rename = "judul")]
    pub title: String,
    #[serde(rename = "peminjam")]
    pub borrower: String,
    #[serde(rename = "tanggal_kembali")]
    pub due_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub totals: DashboardTotals,
    pub recent: Vec<RecentLoan>,
    pub overdue: Vec<OverdueLoan>,
}
