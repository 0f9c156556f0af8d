//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_LOG_LEVEL, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_SESSION_FILE, DEFAULT_SESSION_NAMESPACE,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Total attempts per transport call (1 = no transport-level retries)
    pub max_attempts: usize,
    /// Upper bound for a single token refresh round trip
    pub refresh_timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

/// Where the credential pair and cached profile are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    /// JSON file on disk
    #[default]
    File,
    /// Platform keychain
    Keychain,
    /// In-process only; nothing survives a restart
    Memory,
}

impl std::str::FromStr for SessionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keychain" => Ok(Self::Keychain),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown session backend: {other}")),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub path: PathBuf,
    /// Prefix for every persisted key (`<namespace>_access_token`, ...)
    pub namespace: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            path: PathBuf::from(DEFAULT_SESSION_FILE),
            namespace: DEFAULT_SESSION_NAMESPACE.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}
