//! Loan ledger.
//!
//! Every mutation that touches `books.stock_count` runs in one transaction
//! holding row locks on the affected book and loan, and writes its activity
//! entry before committing. Within these paths stock only changes by +1 / -1.

use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult, ConstraintExt},
    models::{
        enums::LoanStatus,
        loan::{Checkout, Loan, LoanRecord},
    },
};

use super::activity::ActivityRepository;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

/// Roll back explicitly so the locks are released before the error surfaces
async fn abort<T>(tx: Transaction<'_, Postgres>, err: AppError) -> AppResult<T> {
    tx.rollback().await?;
    Err(err)
}

fn loan_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Loan with id {} not found", id))
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| loan_not_found(id))
    }

    /// Most recently created loans with borrower and title
    pub async fn list_recent(&self, limit: i64) -> AppResult<Vec<LoanRecord>> {
        let loans = sqlx::query_as::<_, LoanRecord>(
            r#"
            SELECT l.id, l.user_id, l.book_id, l.borrowed_on, l.due_on, l.status,
                   u.full_name AS borrower, b.title AS book_title
            FROM loans l
            JOIN users u ON u.id = l.user_id
            JOIN books b ON b.id = l.book_id
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Lend one copy of a book. Stock is checked and decremented under the
    /// book's row lock, so concurrent checkouts never oversell.
    pub async fn checkout(&self, actor_id: i32, checkout: &Checkout) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let stock: Option<i32> =
            sqlx::query_scalar("SELECT stock_count FROM books WHERE id = $1 FOR UPDATE")
                .bind(checkout.book_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(stock) = stock else {
            return abort(tx, AppError::NotFound("Book not found".to_string())).await;
        };

        if stock < 1 {
            return abort(tx, AppError::OutOfStock("Book is out of stock".to_string())).await;
        }

        let borrower_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(checkout.user_id)
                .fetch_one(&mut *tx)
                .await?;

        if !borrower_exists {
            return abort(tx, AppError::NotFound("Member not found".to_string())).await;
        }

        let loan_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO loans (user_id, book_id, borrowed_on, due_on, status)
            VALUES ($1, $2, COALESCE($3, CURRENT_DATE), $4, $5)
            RETURNING id
            "#,
        )
        .bind(checkout.user_id)
        .bind(checkout.book_id)
        .bind(checkout.borrowed_on)
        .bind(checkout.due_on)
        .bind(LoanStatus::Active)
        .fetch_one(&mut *tx)
        .await
        .on_foreign_key_violation(|| AppError::NotFound("Member not found".to_string()))?;

        sqlx::query("UPDATE books SET stock_count = stock_count - 1 WHERE id = $1")
            .bind(checkout.book_id)
            .execute(&mut *tx)
            .await?;

        ActivityRepository::append(
            &mut *tx,
            Some(actor_id),
            &format!("Recorded loan #{}", loan_id),
        )
        .await?;

        tx.commit().await?;
        Ok(loan_id)
    }

    /// Mark an active loan returned and put the copy back on the shelf
    pub async fn mark_returned(&self, actor_id: i32, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let loan: Option<Loan> = sqlx::query_as("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(loan) = loan else {
            return abort(tx, loan_not_found(id)).await;
        };

        if loan.status == LoanStatus::Returned {
            return abort(
                tx,
                AppError::Conflict("Book has already been returned".to_string()),
            )
            .await;
        }

        sqlx::query("UPDATE loans SET status = $1 WHERE id = $2")
            .bind(LoanStatus::Returned)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET stock_count = stock_count + 1 WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        ActivityRepository::append(
            &mut *tx,
            Some(actor_id),
            &format!("Marked loan #{} as returned", id),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Move the due date of an active loan. Stock is untouched.
    pub async fn extend(&self, actor_id: i32, id: i32, due_on: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE loans SET due_on = $1 WHERE id = $2 AND status = $3")
            .bind(due_on)
            .bind(id)
            .bind(LoanStatus::Active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing loan from a returned one
            self.get_by_id(id).await?;
            return Err(AppError::Conflict(
                "Returned loans cannot be extended".to_string(),
            ));
        }

        ActivityRepository::append(
            &self.pool,
            Some(actor_id),
            &format!("Extended loan #{} until {}", id, due_on.format("%Y-%m-%d")),
        )
        .await
    }

    /// Remove a loan record. An active loan gives its copy back first.
    pub async fn delete(&self, actor_id: i32, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let loan: Option<Loan> = sqlx::query_as("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(loan) = loan else {
            return abort(tx, loan_not_found(id)).await;
        };

        if loan.status == LoanStatus::Active {
            sqlx::query("UPDATE books SET stock_count = stock_count + 1 WHERE id = $1")
                .bind(loan.book_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityRepository::append(&mut *tx, Some(actor_id), &format!("Deleted loan #{}", id))
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
