//! Configuration loader
//!
//! Builds the client configuration from defaults, an optional config file and
//! environment variables.
//!
//! ## Loading Strategy
//! 1. Start from [`Config::default`]
//! 2. Overlay a config file: the explicit path if one was given, otherwise the
//!    first file found by [`probe_config_paths`]
//! 3. Overlay environment variables (a `.env` file is honoured by the binary)
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `PRIVACYGUARD_API_URL`: Backend base URL
//! - `PRIVACYGUARD_API_TIMEOUT_SECS`: Per-request timeout
//! - `PRIVACYGUARD_API_MAX_ATTEMPTS`: Transport attempts per call
//! - `PRIVACYGUARD_REFRESH_TIMEOUT_SECS`: Upper bound for one token refresh
//! - `PRIVACYGUARD_SESSION_BACKEND`: `file`, `keychain` or `memory`
//! - `PRIVACYGUARD_SESSION_PATH`: Session file for the `file` backend
//! - `PRIVACYGUARD_SESSION_NAMESPACE`: Prefix of persisted keys
//! - `PRIVACYGUARD_LOG_LEVEL`: Default log filter
//! - `PRIVACYGUARD_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./privacyguard.toml`, `./privacyguard.json`, `./config.toml`,
//!    `./config.json` (current working directory)
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use privacyguard_domain::{Config, PrivacyGuardError, Result, SessionBackend};
use url::Url;

pub const ENV_API_URL: &str = "PRIVACYGUARD_API_URL";
pub const ENV_API_TIMEOUT_SECS: &str = "PRIVACYGUARD_API_TIMEOUT_SECS";
pub const ENV_API_MAX_ATTEMPTS: &str = "PRIVACYGUARD_API_MAX_ATTEMPTS";
pub const ENV_REFRESH_TIMEOUT_SECS: &str = "PRIVACYGUARD_REFRESH_TIMEOUT_SECS";
pub const ENV_SESSION_BACKEND: &str = "PRIVACYGUARD_SESSION_BACKEND";
pub const ENV_SESSION_PATH: &str = "PRIVACYGUARD_SESSION_PATH";
pub const ENV_SESSION_NAMESPACE: &str = "PRIVACYGUARD_SESSION_NAMESPACE";
pub const ENV_LOG_LEVEL: &str = "PRIVACYGUARD_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "PRIVACYGUARD_LOG_JSON";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["privacyguard.toml", "privacyguard.json", "config.toml", "config.json"];

/// Load configuration with the layered strategy described in the module docs.
///
/// # Errors
/// Returns `PrivacyGuardError::Config` if:
/// - `explicit` points at a missing or unparsable file
/// - a probed file is unparsable
/// - an environment variable holds an invalid value
/// - the merged configuration fails [`validate`]
pub fn load(explicit: Option<PathBuf>) -> Result<Config> {
    let base = match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, starting from defaults");
            Config::default()
        }
    };

    let config = apply_env(base, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from defaults and environment variables only.
///
/// # Errors
/// Returns `PrivacyGuardError::Config` for invalid values.
pub fn load_from_env() -> Result<Config> {
    let config = apply_env(Config::default(), |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML (detected by file extension). Missing sections and fields take their
/// defaults.
///
/// # Errors
/// Returns `PrivacyGuardError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PrivacyGuardError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PrivacyGuardError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PrivacyGuardError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PrivacyGuardError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PrivacyGuardError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(PrivacyGuardError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a config file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
        dirs.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Overlay environment values onto `config`.
///
/// `lookup` resolves a variable name; unset and blank variables leave the
/// existing value untouched.
///
/// # Errors
/// Returns `PrivacyGuardError::Config` if a variable cannot be parsed.
pub fn apply_env<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(url) = var(ENV_API_URL) {
        config.api.base_url = url;
    }
    if let Some(raw) = var(ENV_API_TIMEOUT_SECS) {
        config.api.timeout_secs = parse_number(ENV_API_TIMEOUT_SECS, &raw)?;
    }
    if let Some(raw) = var(ENV_API_MAX_ATTEMPTS) {
        config.api.max_attempts = parse_number(ENV_API_MAX_ATTEMPTS, &raw)?;
    }
    if let Some(raw) = var(ENV_REFRESH_TIMEOUT_SECS) {
        config.api.refresh_timeout_secs = parse_number(ENV_REFRESH_TIMEOUT_SECS, &raw)?;
    }
    if let Some(raw) = var(ENV_SESSION_BACKEND) {
        config.session.backend = SessionBackend::from_str(&raw).map_err(PrivacyGuardError::Config)?;
    }
    if let Some(path) = var(ENV_SESSION_PATH) {
        config.session.path = PathBuf::from(path);
    }
    if let Some(namespace) = var(ENV_SESSION_NAMESPACE) {
        config.session.namespace = namespace;
    }
    if let Some(level) = var(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    config.logging.json = env_bool(var(ENV_LOG_JSON).as_deref(), config.logging.json);

    Ok(config)
}

/// Reject configurations the client cannot run with.
///
/// # Errors
/// Returns `PrivacyGuardError::Config` describing the first problem found.
pub fn validate(config: &Config) -> Result<()> {
    let url = Url::parse(&config.api.base_url).map_err(|e| {
        PrivacyGuardError::Config(format!("Invalid API base URL '{}': {e}", config.api.base_url))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PrivacyGuardError::Config(format!(
            "API base URL must use http or https, got '{}'",
            url.scheme()
        )));
    }
    if config.api.timeout_secs == 0 {
        return Err(PrivacyGuardError::Config("api.timeout_secs must be at least 1".into()));
    }
    if config.api.refresh_timeout_secs == 0 {
        return Err(PrivacyGuardError::Config(
            "api.refresh_timeout_secs must be at least 1".into(),
        ));
    }
    if config.api.max_attempts == 0 {
        return Err(PrivacyGuardError::Config("api.max_attempts must be at least 1".into()));
    }
    if config.session.namespace.trim().is_empty() {
        return Err(PrivacyGuardError::Config("session.namespace must not be empty".into()));
    }
    Ok(())
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| PrivacyGuardError::Config(format!("Invalid {key}: {e}")))
}

/// Parse a boolean flag.
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive). Anything else, or an unset value, yields `default`.
fn env_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
