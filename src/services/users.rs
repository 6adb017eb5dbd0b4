//! User account management

use validator::{Validate, ValidateEmail};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{
            non_empty, parse_role, CreateUser, Identity, NewUser, UpdateUser, UserChanges,
            UserRecord,
        },
    },
    repository::Repository,
};

use super::auth::hash_password;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

/// Usernames are stored lowercased
fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

fn checked_email(email: Option<String>) -> AppResult<Option<String>> {
    match non_empty(email.map(|e| e.trim().to_string())) {
        Some(email) if !email.validate_email() => {
            Err(AppError::missing_field("email", "Invalid email format"))
        }
        other => Ok(other),
    }
}

/// Role for a new account. Only the head librarian may choose one.
fn granted_role(actor: &Identity, requested: Option<String>) -> AppResult<Role> {
    if !actor.is_head() {
        return Ok(Role::Member);
    }
    match non_empty(requested) {
        Some(role) => parse_role(&role),
        None => Ok(Role::Member),
    }
}

/// Translate an update request into column changes, hashing the password
fn user_changes(input: UpdateUser) -> AppResult<UserChanges> {
    let password_hash = match non_empty(input.password) {
        Some(password) => Some(hash_password(&password)?),
        None => None,
    };
    let role = match non_empty(input.role) {
        Some(role) => Some(parse_role(&role)?),
        None => None,
    };

    Ok(UserChanges {
        username: non_empty(input.username.map(|u| normalize_username(&u))),
        full_name: non_empty(input.nama_lengkap),
        email: checked_email(input.email)?,
        phone: non_empty(input.no_telp),
        address: non_empty(input.alamat),
        role,
        password_hash,
    })
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_members(&self) -> AppResult<Vec<UserRecord>> {
        self.repository.users.list_members().await
    }

    pub async fn list_all(&self) -> AppResult<Vec<UserRecord>> {
        self.repository.users.list_all().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<UserRecord> {
        self.repository.users.get_by_id(id).await
    }

    /// Create an account. Staff can only register members.
    pub async fn create(&self, actor: &Identity, input: CreateUser) -> AppResult<i32> {
        input.validate()?;

        let username = normalize_username(input.username.as_deref().unwrap_or_default());
        if username.is_empty() {
            return Err(AppError::missing_field("username", "Username is required"));
        }

        let role = granted_role(actor, input.role)?;
        let user = NewUser {
            username,
            full_name: input.nama_lengkap.unwrap_or_default(),
            password_hash: hash_password(input.password.as_deref().unwrap_or_default())?,
            email: checked_email(input.email)?,
            phone: non_empty(input.no_telp),
            address: non_empty(input.alamat),
            role,
        };

        let id = self.repository.users.create(&user).await?;
        self.repository
            .activity
            .record(
                Some(actor.id),
                &format!("Created account {} as {}", user.username, role),
            )
            .await?;
        tracing::info!(user_id = id, role = role.as_str(), "Account created");
        Ok(id)
    }

    /// Partial update; empty fields are left as they are
    pub async fn update(&self, actor: &Identity, id: i32, input: UpdateUser) -> AppResult<()> {
        let changes = user_changes(input)?;
        if changes.is_empty() {
            return Err(AppError::validation("No changes to save"));
        }

        self.repository.users.update(id, &changes).await?;
        self.repository
            .activity
            .record(Some(actor.id), &format!("Updated account #{}", id))
            .await
    }

    pub async fn delete(&self, actor: &Identity, id: i32) -> AppResult<()> {
        self.repository.users.delete(id).await?;
        self.repository
            .activity
            .record(Some(actor.id), &format!("Deleted account #{}", id))
            .await
    }

    /// Create a head librarian account outside of any session
    pub async fn create_head(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
    ) -> AppResult<i32> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }

        let user = NewUser {
            full_name: if full_name.trim().is_empty() {
                username.clone()
            } else {
                full_name.trim().to_string()
            },
            username,
            password_hash: hash_password(password)?,
            email: None,
            phone: None,
            address: None,
            role: Role::Head,
        };

        let id = self.repository.users.create(&user).await?;
        self.repository
            .activity
            .record(None, &format!("Bootstrapped head librarian {}", user.username))
            .await?;
        Ok(id)
    }
}
