// handlers/auth/login.rs - POST /auth/login handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::ApiError;
use crate::users::verify_password;
use crate::AppState;

use super::AuthTokensResponse;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Authenticates credentials and mints an access/refresh pair under a
/// fresh token group. Unknown email and wrong password produce the same
/// response so the endpoint is not a user-enumeration oracle.
pub async fn login_post(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    let user = state
        .users
        .load_by_email(&body.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&user.password_hash, &body.password) {
        return Err(invalid_credentials());
    }

    let pair = state.issuer.issue_login_tokens(user.id)?;
    tracing::debug!(user_id = %user.id, "login issued new token group");

    Ok(Json(AuthTokensResponse {
        access_token: pair.access_token,
        refresh_token: Some(pair.refresh_token),
    }))
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid credentials")
}
