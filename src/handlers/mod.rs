// handlers/mod.rs - HTTP handler modules
pub mod auth;
