//! Testing utilities and helpers
//!
//! - **[`mocks`]**: scripted [`TokenRefresher`](crate::auth::TokenRefresher)
//!   and a storage backend that fails on demand
//!
//! ## Usage
//!
//! ```rust
//! use privacyguard_common::auth::CredentialPair;
//! use privacyguard_common::testing::MockTokenRefresher;
//!
//! let refresher = MockTokenRefresher::new();
//! refresher.push_ok(CredentialPair::new("a2", "r2"));
//! assert_eq!(refresher.calls(), 0);
//! ```

pub mod mocks;

pub use mocks::{FailingStore, MockTokenRefresher};
