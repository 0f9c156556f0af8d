//! User account types
//!
//! Profiles as returned by `/api/users/*`, plus the payloads used to create
//! accounts and change roles.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Role assigned to an account by the backend.
///
/// Unknown role names are preserved rather than rejected so a newer backend
/// cannot break profile decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    User,
    Admin,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Self::User,
            "admin" => Self::Admin,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// Profile of an account (`UserResponse` on the backend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Client-side gating only; the backend enforces roles on every call.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Registration payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Payload for `PATCH /api/users/{id}/role`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_profile() {
        let user: User = serde_json::from_str(
            r#"{"id": 7, "username": "ana", "email": "ana@example.com", "role": "admin"}"#,
        )
        .unwrap();

        assert_eq!(user.id, 7);
        assert!(user.is_admin());
    }

    #[test]
    fn unknown_role_is_preserved() {
        let user: User = serde_json::from_str(
            r#"{"id": 1, "username": "m", "email": "m@example.com", "role": "moderator"}"#,
        )
        .unwrap();

        assert_eq!(user.role, Role::Other("moderator".into()));
        assert!(!user.is_admin());
        assert_eq!(serde_json::to_value(&user.role).unwrap(), "moderator");
    }

    #[test]
    fn missing_role_defaults_to_user() {
        let user: User =
            serde_json::from_str(r#"{"id": 2, "username": "u", "email": "u@example.com"}"#)
                .unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn role_parsing_ignores_case() {
        assert_eq!(Role::from("ADMIN"), Role::Admin);
        assert_eq!(Role::from(" user "), Role::User);
    }
}
