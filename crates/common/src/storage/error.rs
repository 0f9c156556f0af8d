//! Storage error types

use std::path::PathBuf;

use privacyguard_domain::PrivacyGuardError;
use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt store {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convert StorageError to the domain error for callers outside this crate
impl From<StorageError> for PrivacyGuardError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::Keychain("locked".to_string());
        assert_eq!(err.to_string(), "Keychain error: locked");

        let err = StorageError::Corrupt {
            path: PathBuf::from("/tmp/session.json"),
            message: "expected object".into(),
        };
        assert_eq!(err.to_string(), "Corrupt store /tmp/session.json: expected object");
    }

    #[test]
    fn converts_into_domain_storage_error() {
        let err: PrivacyGuardError = StorageError::Unavailable("closed".into()).into();
        assert!(matches!(err, PrivacyGuardError::Storage(msg) if msg.contains("closed")));
    }
}
