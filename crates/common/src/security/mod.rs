//! Platform security integrations
//!
//! Currently the platform keychain, exposed as a session storage backend.

pub mod keychain;

pub use keychain::{KeychainError, KeychainProvider};
