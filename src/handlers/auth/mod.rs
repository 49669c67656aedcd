// handlers/auth/mod.rs - Session lifecycle endpoints
//
// Token acquisition and session management. Login is the only endpoint
// reachable without a bearer token; refresh requires a REFRESH-kind
// token, logout and me require ACCESS-kind tokens.

use serde::Serialize;

pub mod login;
pub mod logout;
pub mod me;
pub mod refresh;

pub use login::login_post;
pub use logout::logout_post;
pub use me::me_get;
pub use refresh::refresh_get;

/// Wire contract shared by login and refresh. `refresh_token` is omitted
/// entirely (not null) when no new refresh token was minted; clients key
/// off field presence to decide whether to replace their stored token.
#[derive(Debug, Serialize)]
pub struct AuthTokensResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_token_field_absent_when_no_rotation() {
        let body = serde_json::to_value(AuthTokensResponse {
            access_token: "a".to_string(),
            refresh_token: None,
        })
        .unwrap();
        assert!(body.get("refresh_token").is_none());

        let body = serde_json::to_value(AuthTokensResponse {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
        })
        .unwrap();
        assert_eq!(body["refresh_token"], "r");
    }
}
