//! Principal lookup. The account store is an external collaborator; the
//! token core only ever reads principals through the narrow trait below.

use std::collections::HashMap;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

pub mod postgres;

pub use postgres::PostgresUserDirectory;

/// The authenticated identity backing a request. The password hash never
/// leaves this module's callers; response types carry a redacted view.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    pub roles: Vec<String>,
}

#[derive(Debug, Error)]
pub enum UserLookupError {
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn load_by_id(&self, id: Uuid) -> Result<Option<Principal>, UserLookupError>;

    async fn load_by_email(&self, email: &str) -> Result<Option<Principal>, UserLookupError>;
}

/// Constant-time verification of a candidate password against a stored
/// PHC-format hash. An unparseable stored hash verifies as false rather
/// than erroring, so a corrupt row reads as bad credentials.
pub fn verify_password(stored_hash: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

/// Hashes a password into PHC format. Account provisioning lives outside
/// this service; this exists for fixtures and operational tooling.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// In-process directory for tests and local development.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, Principal>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, principal: Principal) {
        self.users.write().await.insert(principal.id, principal);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn load_by_id(&self, id: Uuid) -> Result<Option<Principal>, UserLookupError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn load_by_email(&self, email: &str) -> Result<Option<Principal>, UserLookupError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|p| p.email == email)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("s3cret-passw0rd").unwrap();
        assert!(verify_password(&hash, "s3cret-passw0rd"));
        assert!(!verify_password(&hash, "s3cret-passw0rd "));
        assert!(!verify_password(&hash, ""));
    }

    #[test]
    fn corrupt_stored_hash_reads_as_bad_credentials() {
        assert!(!verify_password("not-a-phc-hash", "anything"));
    }

    #[tokio::test]
    async fn in_memory_lookup_by_id_and_email() {
        let directory = InMemoryUserDirectory::new();
        let id = Uuid::new_v4();
        directory
            .insert(Principal {
                id,
                email: "host@example.com".to_string(),
                password_hash: "x".to_string(),
                enabled: true,
                roles: vec!["ROLE_HOST".to_string()],
            })
            .await;

        assert!(directory.load_by_id(id).await.unwrap().is_some());
        assert!(directory.load_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(
            directory
                .load_by_email("host@example.com")
                .await
                .unwrap()
                .unwrap()
                .id,
            id
        );
        assert!(directory.load_by_email("other@example.com").await.unwrap().is_none());
    }
}
