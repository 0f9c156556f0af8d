//! Authentication payloads

use serde::{Deserialize, Serialize};

/// Login payload for `POST /api/auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body carrying a refresh credential (`/api/auth/refresh`, `/api/auth/logout`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Credential pair issued by login and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_type_defaults_to_bearer() {
        let tokens: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a1", "refresh_token": "r1"}"#).unwrap();
        assert_eq!(tokens.token_type, "Bearer");
    }
}
