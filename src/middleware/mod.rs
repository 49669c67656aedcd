pub mod auth;

pub use auth::{token_auth_middleware, AuthSession};
