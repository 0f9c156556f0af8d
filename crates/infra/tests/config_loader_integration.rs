//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! validating the result.

use std::path::PathBuf;

use privacyguard_domain::{PrivacyGuardError, SessionBackend};
use privacyguard_infra::config;

#[test]
fn test_load_config_from_toml_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("privacyguard.toml");
    std::fs::write(
        &path,
        r#"
[api]
base_url = "https://privacyguard.example/backend"
timeout_secs = 15
max_attempts = 2
refresh_timeout_secs = 5
user_agent = "privacyguard-tests"

[session]
backend = "file"
path = "/tmp/pg-integration-session.json"
namespace = "integration"

[logging]
level = "debug"
json = true
"#,
    )
    .expect("Failed to write config");

    let config = config::load(Some(path)).expect("config should load");

    assert_eq!(config.api.base_url, "https://privacyguard.example/backend");
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.api.max_attempts, 2);
    assert_eq!(config.api.refresh_timeout_secs, 5);
    assert_eq!(config.api.user_agent.as_deref(), Some("privacyguard-tests"));
    assert_eq!(config.session.backend, SessionBackend::File);
    assert_eq!(config.session.path, PathBuf::from("/tmp/pg-integration-session.json"));
    assert_eq!(config.session.namespace, "integration");
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
}

#[test]
fn test_load_config_from_json_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("privacyguard.json");
    std::fs::write(
        &path,
        r#"{
            "api": { "base_url": "http://127.0.0.1:9000" },
            "session": { "backend": "memory" }
        }"#,
    )
    .expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("config should load");

    assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
    assert_eq!(config.session.backend, SessionBackend::Memory);
    // Unspecified sections keep their defaults
    assert_eq!(config.api.max_attempts, 1);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let result = config::load(Some(dir.path().join("absent.toml")));

    assert!(matches!(result, Err(PrivacyGuardError::Config(msg)) if msg.contains("not found")));
}

#[test]
fn test_invalid_base_url_fails_validation() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("privacyguard.toml");
    std::fs::write(&path, "[api]\nbase_url = \"localhost without scheme\"\n")
        .expect("Failed to write config");

    let loaded = config::load_from_file(Some(path)).expect("file parses");
    let result = config::validate(&loaded);

    assert!(matches!(result, Err(PrivacyGuardError::Config(msg)) if msg.contains("base URL")));
}

#[test]
fn test_env_overrides_file_values() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[api]\nbase_url = \"https://file.example\"\ntimeout_secs = 10\n")
        .expect("Failed to write config");

    let from_file = config::load_from_file(Some(path)).expect("file parses");
    let merged = config::apply_env(from_file, |key| match key {
        "PRIVACYGUARD_API_URL" => Some("https://env.example".to_string()),
        _ => None,
    })
    .expect("env applies");

    assert_eq!(merged.api.base_url, "https://env.example");
    assert_eq!(merged.api.timeout_secs, 10);
}
