// Shared test harness: an in-process app with in-memory collaborators,
// driven through the router with oneshot requests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use rooms_api_rust::config::JwtConfig;
use rooms_api_rust::revocation::InMemoryRevocationStore;
use rooms_api_rust::token::codec::SigningKey;
use rooms_api_rust::users::{hash_password, InMemoryUserDirectory, Principal};
use rooms_api_rust::{app, AppState};

pub const TEST_EMAIL: &str = "host@example.com";
pub const TEST_PASSWORD: &str = "s3cret-passw0rd";
pub const TEST_SECRET: &str = "integration-test-signing-secret";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
    pub user_id: Uuid,
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        access_expiration_seconds: 120,
        refresh_expiration_minutes: 60,
        rotation_threshold_seconds: 60,
        secret: Some(TEST_SECRET.to_string()),
    }
}

/// Builds the full router with one seeded, enabled account.
pub async fn build_app() -> TestApp {
    build_app_with_config(test_jwt_config()).await
}

pub async fn build_app_with_config(jwt: JwtConfig) -> TestApp {
    let users = InMemoryUserDirectory::new();
    let user_id = Uuid::new_v4();
    users
        .insert(Principal {
            id: user_id,
            email: TEST_EMAIL.to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            enabled: true,
            roles: vec!["ROLE_HOST".to_string()],
        })
        .await;

    let state = Arc::new(AppState::new(
        &jwt,
        SigningKey::from_secret(TEST_SECRET.as_bytes()),
        Arc::new(InMemoryRevocationStore::new()),
        Arc::new(users),
    ));

    TestApp {
        router: app(state.clone()),
        state,
        user_id,
    }
}

impl TestApp {
    pub async fn get(&self, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, path, bearer, None).await
    }

    pub async fn post(&self, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::POST, path, bearer, None).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send(Method::POST, path, None, Some(body)).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Logs the seeded user in and returns (access_token, refresh_token).
    pub async fn login(&self) -> (String, String) {
        let (status, body) = self
            .post_json(
                "/auth/login",
                serde_json::json!({ "username": TEST_EMAIL, "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}
