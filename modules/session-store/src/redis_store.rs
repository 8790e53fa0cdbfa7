//! Redis-backed session store for distributed deployments.
//!
//! Records are stored as JSON under `{prefix}{session_id}` with a server-side
//! TTL (`SET ... EX`). Sliding the TTL rewrites the record so that
//! `last_accessed_at` stays current; the operation is last-write-wins, which
//! is safe because every writer produces an equivalent refresh.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands as _;
use redis::aio::ConnectionManager;

use crate::{SessionRecord, SessionStore, StoreError};

pub struct RedisSessionStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisSessionStore {
    /// Connect to Redis and verify the connection with a `PING`.
    ///
    /// # Errors
    ///
    /// Fails when the URL is invalid or the server is unreachable.
    pub async fn connect(url: &str, key_prefix: String) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(Self { conn, key_prefix })
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}{session_id}", self.key_prefix)
    }

    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.key(session_id))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StoreError::Codec(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put(&self, record: SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = self.key(&record.session_id);
        let json = serde_json::to_string(&record).map_err(|e| StoreError::Codec(e.to_string()))?;
        conn.set_ex::<_, _, ()>(key, json, Self::ttl_secs(ttl))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn touch(&self, session_id: &str, ttl: Duration) -> Result<(), StoreError> {
        // Fetch-modify-write keeps last_accessed_at accurate across nodes.
        let Some(mut record) = self.get(session_id).await? else {
            return Ok(());
        };
        record.last_accessed_at = Utc::now();
        self.put(record, ttl).await
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(session_id))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
