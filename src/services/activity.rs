//! Activity log reader

use crate::{error::AppResult, models::activity::ActivityEntry, repository::Repository};

const ACTIVITY_LIST_LIMIT: i64 = 60;

#[derive(Clone)]
pub struct ActivityService {
    repository: Repository,
}

impl ActivityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Latest entries, newest first
    pub async fn latest(&self) -> AppResult<Vec<ActivityEntry>> {
        self.repository.activity.latest(ACTIVITY_LIST_LIMIT).await
    }
}
