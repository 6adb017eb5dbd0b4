//! Smart Library server
//!
//! Back office for a small library: catalog of books and categories,
//! member accounts, a loan ledger that keeps stock consistent, an activity
//! log and a dashboard, served as a JSON API behind cookie sessions.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
