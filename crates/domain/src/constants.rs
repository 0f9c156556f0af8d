//! Application constants
//!
//! Centralized location for domain-level constants: backend endpoint paths,
//! persisted key names and configuration defaults.

// Backend endpoints
pub const AUTH_REGISTER_PATH: &str = "/api/auth/register";
pub const AUTH_LOGIN_PATH: &str = "/api/auth/login";
pub const AUTH_REFRESH_PATH: &str = "/api/auth/refresh";
pub const AUTH_LOGOUT_PATH: &str = "/api/auth/logout";
pub const USERS_PATH: &str = "/api/users/";
pub const USERS_ME_PATH: &str = "/api/users/me";
pub const MEDIA_PATH: &str = "/api/media/";
pub const MEDIA_UPLOAD_PATH: &str = "/api/media/upload";

/// Path of a single user resource.
pub fn user_path(user_id: i64) -> String {
    format!("/api/users/{user_id}")
}

/// Path of the role sub-resource of a user.
pub fn user_role_path(user_id: i64) -> String {
    format!("/api/users/{user_id}/role")
}

/// Path of a single media resource.
pub fn media_path(media_id: i64) -> String {
    format!("/api/media/{media_id}")
}

/// Path of the processed bytes of a media resource.
pub fn media_download_path(media_id: i64) -> String {
    format!("/api/media/{media_id}/download")
}

// Persisted session keys (suffixes appended to the configured namespace)
pub const ACCESS_TOKEN_KEY_SUFFIX: &str = "access_token";
pub const REFRESH_TOKEN_KEY_SUFFIX: &str = "refresh_token";
pub const USER_KEY_SUFFIX: &str = "user";
pub const DEFAULT_SESSION_NAMESPACE: &str = "privacyguard";

// Configuration defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: usize = 1;
pub const DEFAULT_SESSION_FILE: &str = "privacyguard-session.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Media
pub const UPLOAD_FILE_FIELD: &str = "file";
pub const DOWNLOAD_FILE_PREFIX: &str = "censored_";
