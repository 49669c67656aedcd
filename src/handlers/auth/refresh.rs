// handlers/auth/refresh.rs - GET /auth/refresh handler

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::middleware::AuthSession;
use crate::AppState;

use super::AuthTokensResponse;

/// Exchanges a valid refresh token for a new access token, rotating the
/// token group when the refresh token is near expiry. The middleware has
/// already validated the REFRESH-kind token and its revocation state;
/// this handler only drives the rotation decision.
pub async fn refresh_get(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    let tokens = state
        .rotator
        .refresh(session.principal.id, &session.claims)
        .await?;

    if tokens.refresh_token.is_some() {
        tracing::debug!(
            user_id = %session.principal.id,
            old_group = %session.claims.group_id,
            "refresh rotated token group"
        );
    }

    Ok(Json(AuthTokensResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}
