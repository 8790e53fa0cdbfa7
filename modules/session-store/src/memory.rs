//! In-process session store for single-node and test deployments.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::{SessionRecord, SessionStore, StoreError};

struct Entry {
    record: SessionRecord,
    expires_at: Instant,
}

/// Dashmap-backed store. Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, Entry>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        if let Some(entry) = self.entries.get(session_id) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.record.clone()));
            }
        } else {
            return Ok(None);
        }
        // Read saw an expired entry; drop it outside the read guard.
        self.entries.remove(session_id);
        Ok(None)
    }

    async fn put(&self, record: SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        self.entries.insert(
            record.session_id.clone(),
            Entry {
                record,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn touch(&self, session_id: &str, ttl: Duration) -> Result<(), StoreError> {
        if let Some(mut entry) = self.entries.get_mut(session_id) {
            entry.record.last_accessed_at = Utc::now();
            entry.expires_at = Instant::now() + ttl;
        }
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.entries.remove(session_id);
        Ok(())
    }
}
