//! Redis-backed session store

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::{
    error::{AppError, AppResult},
    models::user::Identity,
};

use super::sessions::{session_key, SessionStore};

#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
}

impl RedisSessionStore {
    /// Open a client and make sure the server answers
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = Client::open(url)?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;

        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, token: &str, identity: &Identity, ttl_seconds: u64) -> AppResult<()> {
        let payload = serde_json::to_string(identity)
            .map_err(|e| AppError::Internal(format!("Failed to encode session: {}", e)))?;

        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(session_key(token), payload, ttl_seconds)
            .await?;
        Ok(())
    }

    async fn get(&self, token: &str, ttl_seconds: u64) -> AppResult<Option<Identity>> {
        let key = session_key(token);
        let mut conn = self.connection().await?;

        let payload: Option<String> = conn.get(&key).await?;
        let Some(payload) = payload else {
            return Ok(None);
        };

        // Sliding expiry
        let _: bool = conn.expire(&key, ttl_seconds as i64).await?;

        match serde_json::from_str(&payload) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!("Discarding unreadable session record: {}", e);
                let _: () = conn.del(&key).await?;
                Ok(None)
            }
        }
    }

    async fn remove(&self, token: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(session_key(token)).await?;
        Ok(())
    }
}
