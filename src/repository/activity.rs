//! Activity log repository (append-only)

use sqlx::{PgExecutor, Pool, Postgres};

use crate::{error::AppResult, models::activity::ActivityEntry};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: Pool<Postgres>,
}

impl ActivityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an entry using any executor, so ledger transactions can log
    /// inside the same commit.
    pub async fn append<'e, E>(executor: E, user_id: Option<i32>, description: &str) -> AppResult<()>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("INSERT INTO activity_log (user_id, description) VALUES ($1, $2)")
            .bind(user_id)
            .bind(description)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Append an entry outside of any transaction
    pub async fn record(&self, user_id: Option<i32>, description: &str) -> AppResult<()> {
        Self::append(&self.pool, user_id, description).await
    }

    /// Latest entries joined with the actor's display name
    pub async fn latest(&self, limit: i64) -> AppResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT l.id, l.description, l.created_at, u.full_name AS actor
            FROM activity_log l
            LEFT JOIN users u ON u.id = l.user_id
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
