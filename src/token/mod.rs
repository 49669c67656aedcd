//! Token lifecycle subsystem: codec, issuer and refresh rotation.
//!
//! Every session is a "token group": an access/refresh pair minted together
//! that shares one correlation UUID. The group is the unit of revocation,
//! so blacklisting one id kills both tokens at once.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod codec;
pub mod issuer;
pub mod rotation;

/// Fixed issuer and audience identifying this service, checked on decode.
pub const SERVICE_IDENTIFIER: &str = "rental-rooms-api";

/// Closed set of token kinds. The kind is embedded in the JWT subject so a
/// refresh token can never be replayed where an access token is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allocates the correlation id shared by an access/refresh pair.
pub fn new_token_group_id() -> Uuid {
    Uuid::new_v4()
}

/// Fully validated claims of a decoded token. Only produced by
/// [`codec::TokenCodec::decode`], which guarantees every field here parsed
/// and matched the expected kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub kind: TokenKind,
    pub user_id: Uuid,
    pub token_id: Uuid,
    pub group_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Reason-tagged decode/encode failures. The tags exist for logging and
/// tests; at the authentication boundary they all collapse into the same
/// "unauthenticated" outcome.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,

    #[error("unexpected token issuer")]
    InvalidIssuer,

    #[error("unexpected token audience")]
    InvalidAudience,

    #[error("invalid token subject")]
    InvalidSubject,

    #[error("invalid token id")]
    InvalidTokenId,

    #[error("invalid token group id")]
    InvalidGroupId,

    #[error("failed to encode token: {0}")]
    Encoding(String),

    #[error("token invariant violation: {0}")]
    InvariantViolation(&'static str),
}
