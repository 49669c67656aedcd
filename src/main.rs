use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;

use rooms_api_rust::config::AppConfig;
use rooms_api_rust::revocation::RedisRevocationStore;
use rooms_api_rust::token::codec::SigningKey;
use rooms_api_rust::users::PostgresUserDirectory;
use rooms_api_rust::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, REDIS_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Out-of-bounds lifetimes or threshold are fatal here, before anything
    // else starts
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        access_seconds = config.jwt.access_expiration_seconds,
        refresh_minutes = config.jwt.refresh_expiration_minutes,
        threshold_seconds = config.jwt.rotation_threshold_seconds,
        "starting rooms API"
    );

    let key = match &config.jwt.secret {
        Some(secret) => SigningKey::from_secret(secret.as_bytes()),
        None => {
            tracing::warn!("JWT_SECRET not set; using a random per-process signing key");
            SigningKey::random()
        }
    };

    let redis_client = redis::Client::open(config.redis.url.as_str())
        .context("invalid REDIS_URL")?;
    let redis_conn = ConnectionManager::new(redis_client)
        .await
        .context("failed to connect to revocation store")?;
    let store = RedisRevocationStore::new(
        redis_conn,
        Duration::from_millis(config.redis.timeout_ms),
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;
    let users = PostgresUserDirectory::new(pool);

    let state = Arc::new(AppState::new(
        &config.jwt,
        key,
        Arc::new(store),
        Arc::new(users),
    ));

    // Allow tests or deployments to override port via env
    let port = std::env::var("ROOMS_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("rooms API listening on http://{bind_addr}");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
