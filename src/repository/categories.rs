//! Categories repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, ConstraintExt},
    models::category::Category,
};

const DUPLICATE_CATEGORY: &str = "A category with this name already exists";
const CATEGORY_IN_USE: &str = "Category is still used by books";

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All categories ordered by name
    pub async fn list(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn create(&self, name: &str, description: Option<&str>) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .on_unique_violation(DUPLICATE_CATEGORY)
    }

    /// Rename / redescribe a category. Books keep the category name they
    /// were saved with.
    pub async fn update(&self, id: i32, name: &str, description: Option<&str>) -> AppResult<()> {
        let result = sqlx::query("UPDATE categories SET name = $1, description = $2 WHERE id = $3")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await
            .on_unique_violation(DUPLICATE_CATEGORY)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category with id {} not found", id)));
        }
        Ok(())
    }

    /// Delete a category unless a book still carries its name
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM categories WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(name) = name else {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Category with id {} not found", id)));
        };

        let in_use: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE category = $1)")
                .bind(&name)
                .fetch_one(&mut *tx)
                .await?;

        if in_use {
            tx.rollback().await?;
            return Err(AppError::Conflict(CATEGORY_IN_USE.to_string()));
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .on_foreign_key_violation(|| AppError::Conflict(CATEGORY_IN_USE.to_string()))?;

        tx.commit().await?;
        Ok(())
    }
}
