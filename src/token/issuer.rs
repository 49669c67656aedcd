//! Access/refresh token minting.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::config::JwtConfig;

use super::codec::TokenCodec;
use super::{new_token_group_id, TokenError, TokenKind};

/// The access/refresh pair minted at login, sharing one fresh token group.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints tokens with the configured lifetimes. Lifetimes are validated at
/// startup, so issuance never fails for configuration reasons.
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(codec: Arc<TokenCodec>, jwt: &JwtConfig) -> Self {
        Self {
            codec,
            access_lifetime: jwt.access_lifetime(),
            refresh_lifetime: jwt.refresh_lifetime(),
        }
    }

    pub fn refresh_lifetime(&self) -> Duration {
        self.refresh_lifetime
    }

    pub fn issue_access_token(&self, user_id: Uuid, group_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        self.codec
            .encode(TokenKind::Access, user_id, group_id, now, now + self.access_lifetime)
    }

    pub fn issue_refresh_token(&self, user_id: Uuid, group_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        self.codec
            .encode(TokenKind::Refresh, user_id, group_id, now, now + self.refresh_lifetime)
    }

    /// Mints the login pair under a freshly allocated group id, so every
    /// login produces an independently revocable lineage.
    pub fn issue_login_tokens(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        let group_id = new_token_group_id();
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id, group_id)?,
            refresh_token: self.issue_refresh_token(user_id, group_id)?,
        })
    }
}
