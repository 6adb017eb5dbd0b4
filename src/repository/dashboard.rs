//! Dashboard aggregates

use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::{
        dashboard::{Dashboard, DashboardTotals, OverdueLoan, RecentLoan},
        enums::Role,
    },
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: Pool<Postgres>,
}

impl DashboardRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Counters and both lists, read from one REPEATABLE READ snapshot so the
    /// overdue counter always agrees with the overdue list.
    pub async fn snapshot(&self, list_limit: i64) -> AppResult<Dashboard> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let totals = totals(&mut tx).await?;
        let recent = recent_loans(&mut tx, list_limit).await?;
        let overdue = overdue_loans(&mut tx, list_limit).await?;
        tx.commit().await?;

        Ok(Dashboard {
            totals,
            recent,
            overdue,
        })
    }
}

async fn totals(conn: &mut PgConnection) -> AppResult<DashboardTotals> {
    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM books) AS books,
            (SELECT COALESCE(SUM(stock_count), 0)::BIGINT FROM books) AS available_books,
            (SELECT COUNT(*) FROM users WHERE role = $1) AS members,
            (SELECT COUNT(*) FROM loans WHERE status = 'active') AS active_loans,
            (SELECT COUNT(*) FROM loans
             WHERE status = 'active' AND due_on < CURRENT_DATE) AS overdue_loans
        "#,
    )
    .bind(Role::Member)
    .fetch_one(&mut *conn)
    .await?;

    Ok(DashboardTotals {
        books: row.get("books"),
        available_books: row.get("available_books"),
        members: row.get("members"),
        active_loans: row.get("active_loans"),
        overdue_loans: row.get("overdue_loans"),
    })
}

async fn recent_loans(conn: &mut PgConnection, limit: i64) -> AppResult<Vec<RecentLoan>> {
    let loans = sqlx::query_as::<_, RecentLoan>(
        r#"
        SELECT l.id, b.title, u.full_name AS borrower, l.status, l.due_on
        FROM loans l
        JOIN books b ON b.id = l.book_id
        JOIN users u ON u.id = l.user_id
        ORDER BY l.created_at DESC, l.id DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(loans)
}

/// Active loans past their due date, most overdue first
async fn overdue_loans(conn: &mut PgConnection, limit: i64) -> AppResult<Vec<OverdueLoan>> {
    let loans = sqlx::query_as::<_, OverdueLoan>(
        r#"
        SELECT l.id, b.title, u.full_name AS borrower, l.due_on
        FROM loans l
        JOIN books b ON b.id = l.book_id
        JOIN users u ON u.id = l.user_id
        WHERE l.status = 'active' AND l.due_on < CURRENT_DATE
        ORDER BY l.due_on ASC, l.id ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(loans)
}
