//! Per-request authentication gate.
//!
//! Decodes the bearer token for the kind the request path expects, checks
//! the revocation store, resolves the principal, and attaches the session
//! as a request extension. A failure at any step leaves the request
//! unauthenticated but never aborts the pipeline; handlers that need a
//! principal reject through the [`AuthSession`] extractor.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::token::{TokenClaims, TokenKind};
use crate::users::Principal;
use crate::AppState;

/// The one path that accepts REFRESH-kind tokens; everything else
/// expects ACCESS.
const REFRESH_PATH: &str = "/auth/refresh";

/// Authenticated request context: the resolved principal plus the
/// validated claims of the token that proved it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub principal: Principal,
    pub claims: TokenClaims,
}

pub async fn token_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let expected_kind = if request.uri().path() == REFRESH_PATH {
        TokenKind::Refresh
    } else {
        TokenKind::Access
    };

    if let Some(session) = authenticate(&state, request.headers(), expected_kind).await {
        request.extensions_mut().insert(session);
    }

    next.run(request).await
}

/// The authentication decision. Fails closed: a store error or timeout on
/// the revocation check means "cannot authenticate", and the check runs
/// before the user lookup so an unavailable user store can never bypass
/// revocation.
async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    expected_kind: TokenKind,
) -> Option<AuthSession> {
    let token = bearer_token(headers)?;

    let claims = match state.codec.decode(token, expected_kind) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!("rejected bearer token: {err}");
            return None;
        }
    };

    match state.blacklist.is_revoked(claims.group_id).await {
        Ok(false) => {}
        Ok(true) => {
            tracing::debug!(group_id = %claims.group_id, "rejected token of revoked group");
            return None;
        }
        Err(err) => {
            tracing::warn!("revocation check failed, treating request as unauthenticated: {err}");
            return None;
        }
    }

    let principal = match state.users.load_by_id(claims.user_id).await {
        Ok(Some(principal)) => principal,
        Ok(None) => {
            tracing::debug!(user_id = %claims.user_id, "token for unknown principal");
            return None;
        }
        Err(err) => {
            tracing::warn!("user lookup failed, treating request as unauthenticated: {err}");
            return None;
        }
    };

    Some(AuthSession { principal, claims })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(ApiError::unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(
            bearer_token(&headers_with_authorization("Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with_authorization("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with_authorization("bearer abc")), None);
        assert_eq!(bearer_token(&headers_with_authorization("Bearer ")), None);
    }
}
