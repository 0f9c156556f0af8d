//! Keychain provider for secure credential storage
//!
//! Thin wrapper over the platform keychain (macOS Keychain Access, Windows
//! Credential Manager, Linux kernel keyutils) that stores each session key as
//! a separate keychain entry under one service name.
//!
//! ## Usage
//!
//! ```no_run
//! use privacyguard_common::security::KeychainProvider;
//!
//! let keychain = KeychainProvider::new("PrivacyGuard.session");
//! keychain.set_secret("privacyguard_refresh_token", "r1")?;
//! let secret = keychain.get_secret("privacyguard_refresh_token")?;
//! assert_eq!(secret, "r1");
//! # Ok::<(), privacyguard_common::security::KeychainError>(())
//! ```

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// Keychain operation errors
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain entry not found")]
    NotFound,

    #[error("Keychain access failed: {0}")]
    AccessFailed(String),
}

impl From<KeychainError> for StorageError {
    fn from(e: KeychainError) -> Self {
        Self::Keychain(e.to_string())
    }
}

/// Keychain provider scoped to one service name
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    /// Create a new keychain provider for a specific service
    ///
    /// # Examples
    /// ```
    /// use privacyguard_common::security::KeychainProvider;
    ///
    /// let keychain = KeychainProvider::new("PrivacyGuard.session");
    /// assert_eq!(keychain.service_name(), "PrivacyGuard.session");
    /// ```
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Store a secret value in the platform keychain
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to store secret for {}: {}", key, e))
        })
    }

    /// Retrieve a secret value from the platform keychain
    ///
    /// # Errors
    /// Returns `KeychainError::NotFound` if secret doesn't exist
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        debug!(service = %self.service_name, key = %key, "Retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        entry.get_password().map_err(|e| {
            if matches!(e, keyring::Error::NoEntry) {
                KeychainError::NotFound
            } else {
                KeychainError::AccessFailed(format!("Failed to retrieve secret for {}: {}", key, e))
            }
        })
    }

    /// Delete a secret from the platform keychain (idempotent)
    pub fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to delete secret for {}: {}",
                key, e
            ))),
        }
    }

    fn create_entry(&self, account: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service_name, account).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to create keychain entry: {}", e))
        })
    }
}

impl KeyValueStore for KeychainProvider {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.get_secret(key) {
            Ok(value) => Ok(Some(value)),
            Err(KeychainError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.set_secret(key, value).map_err(Into::into)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.delete_secret(key).map_err(Into::into)
    }
}
