//! Users repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult, ConstraintExt},
    models::{
        enums::Role,
        user::{NewUser, UserChanges, UserCredentials, UserRecord},
    },
};

const DUPLICATE_USER: &str = "Username or email is already in use";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Find login credentials by username or email (exact match).
    /// A username match wins over another account's email.
    pub async fn find_credentials(&self, identifier: &str) -> AppResult<Option<UserCredentials>> {
        let user = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, username, full_name, email, role, password
            FROM users
            WHERE username = $1 OR email = $1
            ORDER BY (username = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, full_name, email, phone, address, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Member-role accounts ordered by name
    pub async fn list_members(&self) -> AppResult<Vec<UserRecord>> {
        let users = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, full_name, email, phone, address, role, created_at
            FROM users
            WHERE role = $1
            ORDER BY full_name ASC
            "#,
        )
        .bind(Role::Member)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Every account, newest first
    pub async fn list_all(&self) -> AppResult<Vec<UserRecord>> {
        let users = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, full_name, email, phone, address, role, created_at
            FROM users
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Create a user, returning its id
    pub async fn create(&self, user: &NewUser) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO users (username, password, full_name, role, email, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.address)
        .fetch_one(&self.pool)
        .await
        .on_unique_violation(DUPLICATE_USER)
    }

    /// Apply a partial update
    pub async fn update(&self, id: i32, changes: &UserChanges) -> AppResult<()> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut sets = builder.separated(", ");

        if let Some(ref username) = changes.username {
            sets.push("username = ").push_bind_unseparated(username);
        }
        if let Some(ref full_name) = changes.full_name {
            sets.push("full_name = ").push_bind_unseparated(full_name);
        }
        if let Some(ref email) = changes.email {
            sets.push("email = ").push_bind_unseparated(email);
        }
        if let Some(ref phone) = changes.phone {
            sets.push("phone = ").push_bind_unseparated(phone);
        }
        if let Some(ref address) = changes.address {
            sets.push("address = ").push_bind_unseparated(address);
        }
        if let Some(role) = changes.role {
            sets.push("role = ").push_bind_unseparated(role);
        }
        if let Some(ref password_hash) = changes.password_hash {
            sets.push("password = ").push_bind_unseparated(password_hash);
        }

        builder.push(" WHERE id = ").push_bind(id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .on_unique_violation(DUPLICATE_USER)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Delete a user. Refused while the user still has active loans, since
    /// cascading them away would leave the books' stock short.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let found: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if found.is_none() {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active_loans > 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "User still has {} active loan(s)",
                active_loans
            )));
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
