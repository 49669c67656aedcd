use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

/// Process-wide configuration, loaded once at startup. Values outside the
/// allowed bounds are a fatal startup error, never a runtime one.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub redis: RedisConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Access token lifetime in seconds (120..=300).
    pub access_expiration_seconds: u32,
    /// Refresh token lifetime in minutes (15..=60).
    pub refresh_expiration_minutes: u32,
    /// Remaining refresh validity at or below which rotation triggers,
    /// in seconds (30..=1800, strictly less than the refresh lifetime).
    pub rotation_threshold_seconds: u32,
    /// Symmetric signing secret. When absent a fresh random key is
    /// generated at startup, so tokens do not survive a restart.
    pub secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Upper bound for a single revocation-store call.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

const ACCESS_EXPIRATION_MIN: u32 = 120;
const ACCESS_EXPIRATION_MAX: u32 = 300;
const REFRESH_EXPIRATION_MIN: u32 = 15;
const REFRESH_EXPIRATION_MAX: u32 = 60;
const ROTATION_THRESHOLD_MIN: u32 = 30;
const ROTATION_THRESHOLD_MAX: u32 = 1800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfBounds { name: &'static str, min: u32, max: u32, value: u32 },

    #[error("{name} is not a valid integer: {value}")]
    NotANumber { name: &'static str, value: String },

    #[error(
        "refresh rotation threshold ({threshold}s) must be less than \
         the refresh token lifetime ({lifetime}s)"
    )]
    ThresholdTooLarge { threshold: u32, lifetime: u32 },
}

impl JwtConfig {
    pub fn access_lifetime(&self) -> Duration {
        Duration::seconds(i64::from(self.access_expiration_seconds))
    }

    pub fn refresh_lifetime(&self) -> Duration {
        Duration::minutes(i64::from(self.refresh_expiration_minutes))
    }

    pub fn rotation_threshold(&self) -> Duration {
        Duration::seconds(i64::from(self.rotation_threshold_seconds))
    }

    /// Refresh lifetime as the TTL unit the revocation store expects.
    pub fn refresh_lifetime_ttl(&self) -> StdDuration {
        StdDuration::from_secs(u64::from(self.refresh_expiration_minutes) * 60)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_bounds(
            "JWT_ACCESS_EXPIRATION_SECONDS",
            self.access_expiration_seconds,
            ACCESS_EXPIRATION_MIN,
            ACCESS_EXPIRATION_MAX,
        )?;
        check_bounds(
            "JWT_REFRESH_EXPIRATION_MINUTES",
            self.refresh_expiration_minutes,
            REFRESH_EXPIRATION_MIN,
            REFRESH_EXPIRATION_MAX,
        )?;
        check_bounds(
            "JWT_REFRESH_ROTATION_THRESHOLD_SECONDS",
            self.rotation_threshold_seconds,
            ROTATION_THRESHOLD_MIN,
            ROTATION_THRESHOLD_MAX,
        )?;

        let lifetime_seconds = self.refresh_expiration_minutes * 60;
        if self.rotation_threshold_seconds >= lifetime_seconds {
            return Err(ConfigError::ThresholdTooLarge {
                threshold: self.rotation_threshold_seconds,
                lifetime: lifetime_seconds,
            });
        }
        Ok(())
    }
}

fn check_bounds(name: &'static str, value: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfBounds { name, min, max, value });
    }
    Ok(())
}

fn env_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value: raw }),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value: raw }),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt = JwtConfig {
            access_expiration_seconds: env_u32("JWT_ACCESS_EXPIRATION_SECONDS", 120)?,
            refresh_expiration_minutes: env_u32("JWT_REFRESH_EXPIRATION_MINUTES", 60)?,
            rotation_threshold_seconds: env_u32("JWT_REFRESH_ROTATION_THRESHOLD_SECONDS", 60)?,
            secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
        };
        jwt.validate()?;

        let redis = RedisConfig {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            timeout_ms: env_u64("REDIS_TIMEOUT_MS", 2000)?,
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/rooms".to_string()),
            max_connections: env_u32("DATABASE_MAX_CONNECTIONS", 10)?,
        };

        Ok(Self { jwt, redis, database })
    }
}
