//! Login, logout and password hashing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    error::{AppError, AppResult},
    models::user::Identity,
    repository::Repository,
};

use super::sessions::SessionManager;

const INVALID_CREDENTIALS: &str = "Invalid username/email or password";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored digest
pub fn verify_password(password: &str, digest: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(digest)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    sessions: SessionManager,
}

impl AuthService {
    pub fn new(repository: Repository, sessions: SessionManager) -> Self {
        Self {
            repository,
            sessions,
        }
    }

    /// Check credentials and open a session. Returns the session token and
    /// the identity bound to it.
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<(String, Identity)> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(AppError::validation(
                "Username/email and password are required",
            ));
        }

        let user = self
            .repository
            .users
            .find_credentials(identifier)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password, &user.password)? {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let identity = Identity::from(&user);
        let token = self.sessions.establish(&identity).await?;

        // A login that could not be audited must not leave a live session
        if let Err(err) = self
            .repository
            .activity
            .record(Some(identity.id), &format!("Login by {}", identity.username))
            .await
        {
            if let Err(cleanup) = self.sessions.destroy(&token).await {
                tracing::warn!(user_id = identity.id, "Failed to drop unaudited session: {}", cleanup);
            }
            return Err(err);
        }
        tracing::info!(user_id = identity.id, role = identity.role.as_str(), "User logged in");

        Ok((token, identity))
    }

    /// Close the session behind `token`. Unknown tokens are not an error.
    pub async fn logout(&self, token: Option<&str>) -> AppResult<()> {
        let Some(token) = token else {
            return Ok(());
        };

        if let Some(identity) = self.sessions.current(Some(token)).await? {
            self.repository
                .activity
                .record(Some(identity.id), &format!("Logout by {}", identity.username))
                .await?;
            tracing::info!(user_id = identity.id, "User logged out");
        }

        self.sessions.destroy(token).await
    }

    /// Identity of the current session
    pub async fn current(&self, token: Option<&str>) -> AppResult<Option<Identity>> {
        self.sessions.current(token).await
    }
}
