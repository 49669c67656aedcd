//! Token-group revocation: the shared TTL-keyed store of dead lineages.
//!
//! The store is consulted on every authenticated request before the token
//! is otherwise trusted; a cryptographically valid token whose group is
//! revoked is authoritatively invalid.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

pub mod redis;

pub use self::redis::RedisRevocationStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("revocation store unavailable: {0}")]
    Unavailable(String),

    #[error("revocation store call timed out")]
    Timeout,
}

/// Narrow interface over the external TTL key-value store. The core never
/// constructs the store itself; it is passed in as a capability.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Records a revoked group. Idempotent: re-revoking is a no-op
    /// observationally (the TTL restarts, which only extends coverage).
    async fn put(&self, group_id: Uuid, ttl: Duration) -> Result<(), StoreError>;

    /// Whether the group is currently revoked. An error here means
    /// "cannot tell", never "not revoked".
    async fn exists(&self, group_id: Uuid) -> Result<bool, StoreError>;
}

const REVOKE_ATTEMPTS: u32 = 3;

/// Store client fixing the revocation TTL to the refresh-token lifetime,
/// so an entry never needs to outlive the tokens it protects.
#[derive(Clone)]
pub struct GroupBlacklist {
    store: Arc<dyn RevocationStore>,
    ttl: Duration,
}

impl GroupBlacklist {
    pub fn new(store: Arc<dyn RevocationStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Revokes a token group. The write is retried a bounded number of
    /// times; a final failure is propagated, never dropped, since a lost
    /// revocation would reopen a closed lineage.
    pub async fn revoke(&self, group_id: Uuid) -> Result<(), StoreError> {
        let mut last_err = StoreError::Unavailable("no attempt made".to_string());
        for attempt in 1..=REVOKE_ATTEMPTS {
            match self.store.put(group_id, self.ttl).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::warn!(%group_id, attempt, "revocation write failed: {err}");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    pub async fn is_revoked(&self, group_id: Uuid) -> Result<bool, StoreError> {
        self.store.exists(group_id).await
    }
}

/// In-process store used by tests and local development. Entries expire
/// lazily on read, mirroring the TTL semantics of the real store.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<Uuid, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn put(&self, group_id: Uuid, ttl: Duration) -> Result<(), StoreError> {
        self.entries.write().await.insert(group_id, Instant::now() + ttl);
        Ok(())
    }

    async fn exists(&self, group_id: Uuid) -> Result<bool, StoreError> {
        let expired = {
            let entries = self.entries.read().await;
            match entries.get(&group_id) {
                Some(deadline) => Instant::now() >= *deadline,
                None => return Ok(false),
            }
        };
        if expired {
            self.entries.write().await.remove(&group_id);
            return Ok(false);
        }
        Ok(true)
    }
}
