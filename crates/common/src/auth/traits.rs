//! Traits for credential refresh
//!
//! The refresh coordinator only needs "exchange this refresh credential for a
//! new pair"; abstracting it keeps the coordinator independent of the HTTP
//! client and lets tests script refresh outcomes.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::types::CredentialPair;

/// Why a refresh cycle failed.
///
/// `Clone` because a single outcome is handed to every queued waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// No refresh credential is stored; no network call was made
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// The backend refused the refresh credential
    #[error("Refresh rejected: {0}")]
    Rejected(String),

    /// The refresh call never produced a response
    #[error("Refresh transport failure: {0}")]
    Transport(String),

    #[error("Refresh timed out after {0:?}")]
    TimedOut(Duration),

    /// The new pair could not be persisted
    #[error("Failed to store refreshed credentials: {0}")]
    Storage(String),

    /// The session was logged out or replaced while the refresh was in
    /// flight; the new pair was discarded
    #[error("Session ended while refreshing")]
    Superseded,

    /// The task driving the refresh was dropped before it settled
    #[error("Refresh abandoned before completion")]
    Abandoned,
}

/// Exchanges a refresh credential for a new credential pair
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Perform one refresh round trip.
    ///
    /// # Errors
    /// Returns `RefreshError::Rejected` when the backend refuses the
    /// credential and `RefreshError::Transport` when no response arrives.
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError>;
}
