//! Refresh rotation: rotate-or-keep decision for each refresh call.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::revocation::{GroupBlacklist, StoreError};

use super::codec::TokenCodec;
use super::issuer::TokenIssuer;
use super::{new_token_group_id, TokenClaims, TokenError, TokenKind};

/// Outcome of a refresh call. `refresh_token` is present only when
/// rotation occurred; the wire contract preserves that distinction.
#[derive(Debug)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Decides, per refresh call, whether the presented refresh token's group
/// keeps living or is rotated out. Rotation is deferred until the refresh
/// token is near expiry to avoid a revocation-store write on every call;
/// once triggered, the old lineage is revoked before the new one exists.
#[derive(Clone)]
pub struct RefreshRotator {
    issuer: Arc<TokenIssuer>,
    codec: Arc<TokenCodec>,
    blacklist: GroupBlacklist,
    rotation_threshold: Duration,
}

impl RefreshRotator {
    pub fn new(
        issuer: Arc<TokenIssuer>,
        codec: Arc<TokenCodec>,
        blacklist: GroupBlacklist,
        rotation_threshold: Duration,
    ) -> Self {
        Self { issuer, codec, blacklist, rotation_threshold }
    }

    /// Handles one refresh call for an already-validated refresh token.
    ///
    /// Remaining validity above the threshold: a new access token is
    /// minted under the current group, nothing is revoked. At or below
    /// the threshold: the current group is revoked first (the write must
    /// be durable before the new token leaves this function), then a new
    /// group is minted and both tokens are reissued under it.
    pub async fn refresh(
        &self,
        user_id: Uuid,
        refresh_claims: &TokenClaims,
    ) -> Result<RefreshedTokens, RefreshError> {
        let remaining = refresh_claims.expires_at - Utc::now();

        if remaining > self.rotation_threshold {
            let access_token = self
                .issuer
                .issue_access_token(user_id, refresh_claims.group_id)?;
            return Ok(RefreshedTokens { access_token, refresh_token: None });
        }

        // Revoke-then-rotate: a stolen copy of the old refresh token must
        // not be usable concurrently with the new one
        self.blacklist.revoke(refresh_claims.group_id).await?;

        let new_group_id = new_token_group_id();
        let refresh_token = self.issuer.issue_refresh_token(user_id, new_group_id)?;

        // Re-extract the group id from the minted token; a decode failure
        // here means codec and issuer disagree about group-id encoding,
        // which is an internal fault, not a user-facing one
        let minted = self
            .codec
            .decode(&refresh_token, TokenKind::Refresh)
            .map_err(|err| {
                tracing::error!("freshly minted refresh token failed to decode: {err}");
                TokenError::InvariantViolation("minted refresh token did not round-trip")
            })?;

        let access_token = self.issuer.issue_access_token(user_id, minted.group_id)?;
        Ok(RefreshedTokens {
            access_token,
            refresh_token: Some(refresh_token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::revocation::InMemoryRevocationStore;
    use crate::token::codec::SigningKey;

    const THRESHOLD_SECONDS: i64 = 60;

    struct Fixture {
        codec: Arc<TokenCodec>,
        rotator: RefreshRotator,
        blacklist: GroupBlacklist,
    }

    fn fixture() -> Fixture {
        fixture_with_decode_secret(b"rotation-test-secret")
    }

    /// Builds a rotator whose decode side may use a different key than the
    /// issuing side, to exercise the codec/issuer agreement check.
    fn fixture_with_decode_secret(decode_secret: &[u8]) -> Fixture {
        let jwt = JwtConfig {
            access_expiration_seconds: 120,
            refresh_expiration_minutes: 60,
            rotation_threshold_seconds: THRESHOLD_SECONDS as u32,
            secret: None,
        };
        let issue_codec = Arc::new(TokenCodec::new(SigningKey::from_secret(
            b"rotation-test-secret",
        )));
        let decode_codec = Arc::new(TokenCodec::new(SigningKey::from_secret(decode_secret)));
        let issuer = Arc::new(TokenIssuer::new(issue_codec.clone(), &jwt));
        let blacklist = GroupBlacklist::new(
            Arc::new(InMemoryRevocationStore::new()),
            jwt.refresh_lifetime_ttl(),
        );
        let rotator = RefreshRotator::new(
            issuer,
            decode_codec,
            blacklist.clone(),
            jwt.rotation_threshold(),
        );
        Fixture { codec: issue_codec, rotator, blacklist }
    }

    fn refresh_claims_expiring_in(seconds: i64) -> TokenClaims {
        let now = Utc::now();
        TokenClaims {
            kind: TokenKind::Refresh,
            user_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            issued_at: now - Duration::minutes(30),
            expires_at: now + Duration::seconds(seconds),
        }
    }

    #[tokio::test]
    async fn no_rotation_far_from_expiry() {
        let fx = fixture();
        let claims = refresh_claims_expiring_in(1800);

        let tokens = fx.rotator.refresh(claims.user_id, &claims).await.unwrap();

        assert!(tokens.refresh_token.is_none());
        let access = fx.codec.decode(&tokens.access_token, TokenKind::Access).unwrap();
        assert_eq!(access.group_id, claims.group_id);
        assert!(!fx.blacklist.is_revoked(claims.group_id).await.unwrap());
    }

    #[tokio::test]
    async fn remaining_equal_to_threshold_rotates() {
        // The boundary is inclusive: remaining <= threshold triggers
        let fx = fixture();
        let claims = refresh_claims_expiring_in(THRESHOLD_SECONDS);

        let tokens = fx.rotator.refresh(claims.user_id, &claims).await.unwrap();
        assert!(tokens.refresh_token.is_some());
    }

    #[tokio::test]
    async fn remaining_just_above_threshold_does_not_rotate() {
        let fx = fixture();
        // One second above the threshold; the sub-second spent reaching
        // the comparison keeps remaining strictly above it
        let claims = refresh_claims_expiring_in(THRESHOLD_SECONDS + 1);

        let tokens = fx.rotator.refresh(claims.user_id, &claims).await.unwrap();
        assert!(tokens.refresh_token.is_none());
    }

    #[tokio::test]
    async fn rotation_revokes_old_group_and_moves_to_fresh_one() {
        let fx = fixture();
        let claims = refresh_claims_expiring_in(10);

        let tokens = fx.rotator.refresh(claims.user_id, &claims).await.unwrap();

        let new_refresh = fx
            .codec
            .decode(tokens.refresh_token.as_deref().unwrap(), TokenKind::Refresh)
            .unwrap();
        let new_access = fx.codec.decode(&tokens.access_token, TokenKind::Access).unwrap();

        assert_ne!(new_refresh.group_id, claims.group_id);
        assert_eq!(new_access.group_id, new_refresh.group_id);
        assert!(fx.blacklist.is_revoked(claims.group_id).await.unwrap());
        assert!(!fx.blacklist.is_revoked(new_refresh.group_id).await.unwrap());
    }

    #[tokio::test]
    async fn store_failure_aborts_rotation() {
        use crate::revocation::{RevocationStore, StoreError};
        use async_trait::async_trait;

        struct DownStore;

        #[async_trait]
        impl RevocationStore for DownStore {
            async fn put(&self, _: Uuid, _: std::time::Duration) -> Result<(), StoreError> {
                Err(StoreError::Unavailable("down".to_string()))
            }
            async fn exists(&self, _: Uuid) -> Result<bool, StoreError> {
                Err(StoreError::Unavailable("down".to_string()))
            }
        }

        let fx = fixture();
        let rotator = RefreshRotator::new(
            fx.rotator.issuer.clone(),
            fx.rotator.codec.clone(),
            GroupBlacklist::new(Arc::new(DownStore), std::time::Duration::from_secs(3600)),
            fx.rotator.rotation_threshold,
        );

        let claims = refresh_claims_expiring_in(10);
        let result = rotator.refresh(claims.user_id, &claims).await;
        assert!(matches!(result, Err(RefreshError::Store(_))));
    }

    #[tokio::test]
    async fn codec_issuer_disagreement_is_an_invariant_violation() {
        let fx = fixture_with_decode_secret(b"a-mismatched-decode-secret");
        let claims = refresh_claims_expiring_in(10);

        let result = fx.rotator.refresh(claims.user_id, &claims).await;
        assert!(matches!(
            result,
            Err(RefreshError::Token(TokenError::InvariantViolation(_)))
        ));
        // The old lineage still died before the fault surfaced
        assert!(fx.blacklist.is_revoked(claims.group_id).await.unwrap());
    }
}
