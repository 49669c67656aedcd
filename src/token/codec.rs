//! Signed token encoding and fail-closed decoding.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TokenClaims, TokenError, TokenKind, SERVICE_IDENTIFIER};

/// Symmetric HS256 signing key, prepared once and injected into the codec.
/// Never a process global, so tests can run with deterministic keys.
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Fresh random key. Tokens signed with it die with the process.
    pub fn random() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::from_secret(&secret)
    }
}

/// Raw wire-level claims. `tgid` is the token-group correlation id.
#[derive(Debug, Serialize, Deserialize)]
struct RawClaims {
    iss: String,
    aud: String,
    sub: String,
    iat: i64,
    exp: i64,
    jti: String,
    tgid: String,
}

/// Stateless codec holding the prepared key material and validation rules,
/// constructed once and shared by issuer and authenticator.
pub struct TokenCodec {
    key: SigningKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(key: SigningKey) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Exact expiry semantics; the default 60s leeway would let a
        // just-expired token through
        validation.leeway = 0;
        validation.set_issuer(&[SERVICE_IDENTIFIER]);
        validation.set_audience(&[SERVICE_IDENTIFIER]);

        Self { key, validation }
    }

    /// Encodes a signed token of the given kind. Subject is
    /// `"{kind}_{user_id}"`, `jti` is a fresh UUID, timestamps are
    /// caller-supplied.
    pub fn encode(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        group_id: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = RawClaims {
            iss: SERVICE_IDENTIFIER.to_string(),
            aud: SERVICE_IDENTIFIER.to_string(),
            sub: format!("{}_{}", kind, user_id),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            tgid: group_id.to_string(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.key.encoding)
            .map_err(|err| TokenError::Encoding(err.to_string()))
    }

    /// Decodes and validates a token, failing closed on any anomaly:
    /// signature, issuer/audience, expiry, subject structure, token id and
    /// group id are all checked before any field is trusted.
    pub fn decode(&self, token: &str, expected_kind: TokenKind) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<RawClaims>(token, &self.key.decoding, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
                ErrorKind::InvalidAudience => TokenError::InvalidAudience,
                _ => TokenError::Malformed,
            })?;
        let raw = data.claims;

        // Subject must be exactly "{kind}_{uuid}" for the expected kind
        let mut segments = raw.sub.split('_');
        let (kind_segment, id_segment) = match (segments.next(), segments.next(), segments.next()) {
            (Some(kind), Some(id), None) => (kind, id),
            _ => return Err(TokenError::InvalidSubject),
        };
        if kind_segment != expected_kind.as_str() {
            return Err(TokenError::InvalidSubject);
        }
        let user_id = Uuid::parse_str(id_segment).map_err(|_| TokenError::InvalidSubject)?;

        let token_id = Uuid::parse_str(&raw.jti).map_err(|_| TokenError::InvalidTokenId)?;
        let group_id = Uuid::parse_str(&raw.tgid).map_err(|_| TokenError::InvalidGroupId)?;

        let issued_at =
            DateTime::from_timestamp(raw.iat, 0).ok_or(TokenError::Malformed)?;
        let expires_at =
            DateTime::from_timestamp(raw.exp, 0).ok_or(TokenError::Malformed)?;

        Ok(TokenClaims {
            kind: expected_kind,
            user_id,
            token_id,
            group_id,
            issued_at,
            expires_at,
        })
    }
}
