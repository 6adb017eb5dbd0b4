//! Server-side sessions.
//!
//! A session binds an opaque random token (kept by the browser in an
//! HttpOnly cookie) to the authenticated [`Identity`]. Stores only ever see
//! the SHA-256 of the token.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::{
    config::{RedisConfig, SessionBackend, SessionConfig},
    error::AppResult,
    models::user::Identity,
};

use super::redis::RedisSessionStore;

/// Storage for session records
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store (or replace) a session for `ttl_seconds`
    async fn put(&self, token: &str, identity: &Identity, ttl_seconds: u64) -> AppResult<()>;

    /// Look a session up, pushing its expiry back by `ttl_seconds`
    async fn get(&self, token: &str, ttl_seconds: u64) -> AppResult<Option<Identity>>;

    async fn remove(&self, token: &str) -> AppResult<()>;
}

/// Key under which a token's session is stored
pub(crate) fn session_key(token: &str) -> String {
    format!("session:{}", hex::encode(Sha256::digest(token.as_bytes())))
}

/// 32 random bytes, hex encoded
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

struct MemoryEntry {
    identity: Identity,
    expires_at: Instant,
}

/// In-process store for single-instance deployments and tests
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, token: &str, identity: &Identity, ttl_seconds: u64) -> AppResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            session_key(token),
            MemoryEntry {
                identity: identity.clone(),
                expires_at: now + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn get(&self, token: &str, ttl_seconds: u64) -> AppResult<Option<Identity>> {
        let key = session_key(token);
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        match entries.get_mut(&key) {
            Some(entry) if entry.expires_at > now => {
                entry.expires_at = now + Duration::from_secs(ttl_seconds);
                Ok(Some(entry.identity.clone()))
            }
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, token: &str) -> AppResult<()> {
        self.entries.write().await.remove(&session_key(token));
        Ok(())
    }
}

/// Issues, resolves and destroys sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl_seconds: u64,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl_minutes: u64) -> Self {
        Self {
            store,
            ttl_seconds: ttl_minutes.saturating_mul(60).max(1),
        }
    }

    /// Build the store selected in configuration
    pub async fn from_config(session: &SessionConfig, redis: &RedisConfig) -> AppResult<Self> {
        let store: Arc<dyn SessionStore> = match session.backend {
            SessionBackend::Redis => {
                tracing::info!("Using Redis session store");
                Arc::new(RedisSessionStore::connect(&redis.url).await?)
            }
            SessionBackend::Memory => {
                tracing::info!("Using in-memory session store");
                Arc::new(MemorySessionStore::new())
            }
        };
        Ok(Self::new(store, session.ttl_minutes))
    }

    /// Start a new session, returning its token
    pub async fn establish(&self, identity: &Identity) -> AppResult<String> {
        let token = generate_token();
        self.store.put(&token, identity, self.ttl_seconds).await?;
        Ok(token)
    }

    /// Identity bound to `token`, if the session is still alive
    pub async fn current(&self, token: Option<&str>) -> AppResult<Option<Identity>> {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => self.store.get(token, self.ttl_seconds).await,
            None => Ok(None),
        }
    }

    pub async fn destroy(&self, token: &str) -> AppResult<()> {
        self.store.remove(token).await
    }
}
