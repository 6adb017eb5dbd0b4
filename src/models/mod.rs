//! Data models for the Smart Library

pub mod activity;
pub mod book;
pub mod category;
pub mod dashboard;
pub mod enums;
pub mod loan;
pub mod user;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use activity::ActivityEntry;
pub use book::Book;
pub use category::Category;
pub use enums::{LoanStatus, Role};
pub use loan::{Loan, LoanRecord};
pub use user::{Identity, UserRecord};

/// Integer sent either as a JSON number or as a numeric string.
/// Non-numeric text counts as 0.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LooseInt {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseInt {
    pub fn value(&self) -> i64 {
        match self {
            LooseInt::Int(n) => *n,
            LooseInt::Float(f) => *f as i64,
            LooseInt::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    /// An empty string is treated as a missing value
    pub fn is_blank(&self) -> bool {
        matches!(self, LooseInt::Text(s) if s.trim().is_empty())
    }
}
