//! API-specific error types
//!
//! Provides error classification for API operations. Status errors display
//! the server's `detail` message verbatim so callers can surface it as-is.

use std::time::Duration;

use privacyguard_common::auth::RefreshError;
use privacyguard_common::storage::StorageError;
use privacyguard_domain::PrivacyGuardError;
use reqwest::StatusCode;
use thiserror::Error;

use crate::errors::InfraError;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401/403 and irrecoverable sessions
    Authentication,
    /// 429
    RateLimit,
    /// 5xx
    Server,
    /// 4xx except auth, and undecodable responses
    Client,
    /// Connection failures and timeouts
    Network,
    /// Configuration and local storage problems
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    RateLimit(String),

    #[error("{message}")]
    Client { status: u16, message: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// The session could not be recovered; local state has been cleared
    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Classify a non-success status carrying `message`.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimit(message),
            s if s.is_client_error() => Self::Client { status: s.as_u16(), message },
            s if s.is_server_error() => Self::Server { status: s.as_u16(), message },
            _ => Self::Network(message),
        }
    }

    /// HTTP status behind this error, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::RateLimit(_) => Some(429),
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unauthorized(_) | Self::Forbidden(_) | Self::SessionExpired(_) => {
                ApiErrorCategory::Authentication
            }
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::NotFound(_) | Self::Client { .. } | Self::Decode(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) | Self::Storage(_) => ApiErrorCategory::Config,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }
}

impl From<PrivacyGuardError> for ApiError {
    fn from(err: PrivacyGuardError) -> Self {
        match err {
            PrivacyGuardError::Network(message) => Self::Network(message),
            PrivacyGuardError::Auth(message) => Self::Unauthorized(message),
            PrivacyGuardError::Config(message) => Self::Config(message),
            PrivacyGuardError::Storage(message) => Self::Storage(message),
            PrivacyGuardError::NotFound(message) => Self::NotFound(message),
            PrivacyGuardError::InvalidInput(message) => Self::Client { status: 400, message },
            PrivacyGuardError::Internal(message) => Self::Network(message),
        }
    }
}

impl From<ApiError> for PrivacyGuardError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err.category() {
            ApiErrorCategory::Authentication => Self::Auth(message),
            ApiErrorCategory::Network | ApiErrorCategory::RateLimit | ApiErrorCategory::Server => {
                Self::Network(message)
            }
            ApiErrorCategory::Config => Self::Config(message),
            ApiErrorCategory::Client if matches!(err, ApiError::NotFound(_)) => {
                Self::NotFound(message)
            }
            ApiErrorCategory::Client => Self::InvalidInput(message),
        }
    }
}

impl From<InfraError> for ApiError {
    fn from(err: InfraError) -> Self {
        Self::from(err.0)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Outcome of an explicit refresh request (no forced logout involved).
impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::MissingRefreshToken | RefreshError::Rejected(_) => {
                Self::Unauthorized(err.to_string())
            }
            RefreshError::Transport(message) => Self::Network(message),
            RefreshError::TimedOut(after) => Self::Timeout(after),
            RefreshError::Storage(message) => Self::Storage(message),
            RefreshError::Superseded => Self::SessionExpired(err.to_string()),
            RefreshError::Abandoned => Self::Network(err.to_string()),
        }
    }
}
