//! Business logic services

pub mod activity;
pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod loans;
pub mod redis;
pub mod sessions;
pub mod users;

use crate::{error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub sessions: sessions::SessionManager,
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub dashboard: dashboard::DashboardService,
    pub activity: activity::ActivityService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository and session manager
    pub fn new(repository: Repository, sessions: sessions::SessionManager) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), sessions.clone()),
            users: users::UsersService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            dashboard: dashboard::DashboardService::new(repository.clone()),
            activity: activity::ActivityService::new(repository.clone()),
            sessions,
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
