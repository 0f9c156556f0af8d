//! Session and credential infrastructure shared across PrivacyGuard crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - (always on): session state, token store, refresh coordination, memory
//!   and file storage backends
//! - `platform`: platform keychain storage backend
//! - `test-utils`: mock refreshers and failing stores for tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod storage;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{
    CredentialPair, RefreshCoordinator, RefreshError, Session, SessionEvent, SubscriptionId,
    TokenRefresher, TokenStore,
};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};
