// handlers/auth/logout.rs - POST /auth/logout handler

use std::sync::Arc;

use axum::{extract::State, http::StatusCode};

use crate::error::ApiError;
use crate::middleware::AuthSession;
use crate::AppState;

/// Revokes the caller's current token group, killing both the access and
/// refresh token minted with it. The revocation write is retried and a
/// persistent failure surfaces as an error; logout must never silently
/// leave the lineage alive.
pub async fn logout_post(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<StatusCode, ApiError> {
    state.blacklist.revoke(session.claims.group_id).await?;
    tracing::debug!(
        user_id = %session.principal.id,
        group_id = %session.claims.group_id,
        "logout revoked token group"
    );

    Ok(StatusCode::NO_CONTENT)
}
