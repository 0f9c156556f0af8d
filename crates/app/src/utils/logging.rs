use std::time::Duration;

use privacyguard_domain::{LoggingConfig, PrivacyGuardError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so that
/// command results on stdout stay machine-readable. Calling this twice is
/// harmless; the second subscriber is simply not installed.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };

    if installed.is_ok() {
        tracing::debug!(level = %config.level, json = config.json, "tracing initialized");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `PrivacyGuardError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &PrivacyGuardError) -> &'static str {
    match error {
        PrivacyGuardError::Config(_) => "config",
        PrivacyGuardError::Storage(_) => "storage",
        PrivacyGuardError::Network(_) => "network",
        PrivacyGuardError::Auth(_) => "auth",
        PrivacyGuardError::NotFound(_) => "not_found",
        PrivacyGuardError::InvalidInput(_) => "invalid_input",
        PrivacyGuardError::Internal(_) => "internal",
    }
}
