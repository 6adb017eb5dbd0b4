//! Dashboard summary

use crate::{error::AppResult, models::dashboard::Dashboard, repository::Repository};

/// Length of the recent and overdue lists
pub const DASHBOARD_LIST_LIMIT: i64 = 6;

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
}

impl DashboardService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn summary(&self) -> AppResult<Dashboard> {
        self.repository.dashboard.snapshot(DASHBOARD_LIST_LIMIT).await
    }
}
