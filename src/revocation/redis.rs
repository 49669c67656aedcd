//! Redis-backed revocation store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use super::{RevocationStore, StoreError};

/// Sentinel value stored under a revoked group id. Presence is all that
/// matters; the value only guards against key collisions with other data.
const SENTINEL: &str = "group";

/// Thin wrapper over `SET key sentinel EX ttl` / `GET key`. Every call is
/// bounded by the configured timeout; a timed-out read surfaces as an
/// error so the caller fails closed instead of assuming "not revoked".
pub struct RedisRevocationStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisRevocationStore {
    pub fn new(conn: ConnectionManager, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    fn key(group_id: Uuid) -> String {
        format!("blacklist:tgid:{group_id}")
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, group_id: Uuid, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let write = conn.set_ex::<_, _, ()>(Self::key(group_id), SENTINEL, ttl.as_secs());

        tokio::time::timeout(self.timeout, write)
            .await
            .map_err(|_| StoreError::Timeout)?
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    async fn exists(&self, group_id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let read = conn.get::<_, Option<String>>(Self::key(group_id));

        let value = tokio::time::timeout(self.timeout, read)
            .await
            .map_err(|_| StoreError::Timeout)?
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        Ok(value.as_deref() == Some(SENTINEL))
    }
}
