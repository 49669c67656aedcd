use std::sync::Arc;

use axum::{routing::get, routing::post, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod revocation;
pub mod token;
pub mod users;

use config::JwtConfig;
use revocation::{GroupBlacklist, RevocationStore};
use token::codec::{SigningKey, TokenCodec};
use token::issuer::TokenIssuer;
use token::rotation::RefreshRotator;
use users::UserDirectory;

/// Shared per-process services. The signing key and token services are
/// read-only after construction; the revocation store and user directory
/// are the only external collaborators.
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub issuer: Arc<TokenIssuer>,
    pub rotator: RefreshRotator,
    pub blacklist: GroupBlacklist,
    pub users: Arc<dyn UserDirectory>,
}

impl AppState {
    pub fn new(
        jwt: &JwtConfig,
        key: SigningKey,
        store: Arc<dyn RevocationStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(key));
        let issuer = Arc::new(TokenIssuer::new(codec.clone(), jwt));
        let blacklist = GroupBlacklist::new(store, jwt.refresh_lifetime_ttl());
        let rotator = RefreshRotator::new(
            issuer.clone(),
            codec.clone(),
            blacklist.clone(),
            jwt.rotation_threshold(),
        );

        Self { codec, issuer, rotator, blacklist, users }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Auth + session lifecycle
        .merge(auth_routes())
        // Global middleware; the auth layer only attaches a session, it
        // never aborts the request pipeline
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::token_auth_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<Arc<AppState>> {
    use handlers::auth;

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/refresh", get(auth::refresh_get))
        .route("/auth/logout", post(auth::logout_post))
        .route("/auth/me", get(auth::me_get))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Rooms API (Rust)",
            "version": version,
            "endpoints": {
                "login": "POST /auth/login (public)",
                "refresh": "GET /auth/refresh (refresh token required)",
                "logout": "POST /auth/logout (access token required)",
                "me": "GET /auth/me (access token required)",
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
