//! Command execution helpers
//!
//! Provides utilities to reduce boilerplate when implementing commands with
//! timing and logging.

use std::future::Future;
use std::time::Instant;

use privacyguard_domain::Result as DomainResult;
use tracing::debug;

use crate::utils::logging::{error_label, log_command_execution};

/// Execute a command with automatic timing and outcome logging
///
/// # Example
///
/// ```rust,ignore
/// pub async fn whoami(ctx: &AppContext) -> DomainResult<User> {
///     execute_logged("auth::whoami", || async {
///         Ok(ctx.api.current_user().await?)
///     })
///     .await
/// }
/// ```
pub async fn execute_logged<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();

    let result = command_fn().await;

    let elapsed = start.elapsed();
    if let Err(err) = &result {
        debug!(command = command_name, error_type = error_label(err), "command failed");
    }
    log_command_execution(command_name, elapsed, result.is_ok());

    result
}
