//! Session persistence for the gateway.
//!
//! One abstract key-value contract ([`SessionStore`]) with two backends: an
//! in-process map for single-node and test deployments, and Redis for
//! distributed deployments. The backend is picked once at startup by
//! [`build_store`]; nothing else in the workspace knows which one is running.

pub mod memory;
pub mod record;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemorySessionStore;
pub use record::{DelegateGrant, SessionRecord, new_session_id};
pub use redis_store::RedisSessionStore;

/// Failure talking to the session backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or errored out.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be encoded or decoded.
    #[error("session record codec failure: {0}")]
    Codec(String),
}

/// Abstract key-value session contract.
///
/// Atomicity of individual operations is the backend's guarantee; callers do
/// no in-process locking. `touch` is last-write-wins and safe to repeat, so
/// concurrent requests on the same session never need cross-request ordering.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a record by opaque session id. Expired records read as absent.
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Store a record under its session id with the given TTL.
    async fn put(&self, record: SessionRecord, ttl: Duration) -> Result<(), StoreError>;

    /// Refresh `last_accessed_at` and slide the TTL forward.
    async fn touch(&self, session_id: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove a record (logout, or operator-forced invalidation).
    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;
}

/// Which backend the factory builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

/// Session store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SessionStoreConfig {
    pub backend: StoreBackend,
    pub redis: RedisConfig,
}

/// Redis backend settings; ignored for the in-memory backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RedisConfig {
    pub url: String,
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_owned(),
            key_prefix: "bff:session:".to_owned(),
        }
    }
}

/// Build the configured backend. Called once at startup.
///
/// # Errors
///
/// Fails if the Redis backend is selected and a connection cannot be
/// established.
pub async fn build_store(cfg: &SessionStoreConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    match cfg.backend {
        StoreBackend::Memory => {
            tracing::info!(backend = "memory", "session store initialized");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        StoreBackend::Redis => {
            let store =
                RedisSessionStore::connect(&cfg.redis.url, cfg.redis.key_prefix.clone()).await?;
            tracing::info!(backend = "redis", "session store initialized");
            Ok(Arc::new(store))
        }
    }
}
