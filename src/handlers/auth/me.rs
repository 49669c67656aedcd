// handlers/auth/me.rs - GET /auth/me handler

use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::AuthSession;

/// Redacted principal view; the password hash never reaches a response.
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub email: String,
    pub enabled: bool,
    pub roles: Vec<String>,
}

pub async fn me_get(session: AuthSession) -> Json<CurrentUserResponse> {
    let principal = session.principal;
    Json(CurrentUserResponse {
        id: principal.id,
        email: principal.email,
        enabled: principal.enabled,
        roles: principal.roles,
    })
}
