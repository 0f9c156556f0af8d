//! Session credentials and refresh coordination
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │     Session     │  init / teardown, observers, forced logout
//! └────────┬────────┘
//!          │
//!          ├──► TokenStore          (credential pair + cached profile)
//!          │         │
//!          │         └──► KeyValueStore  (memory, file, keychain)
//!          │
//!          └──► RefreshCoordinator  (single-flight refresh, waiter queue)
//!                    │
//!                    └──► TokenRefresher  (backend refresh call)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use privacyguard_common::auth::{RefreshCoordinator, Session, SessionEvent};
//! use privacyguard_common::storage::MemoryStore;
//!
//! let session = Session::init(Arc::new(MemoryStore::new()), "privacyguard");
//! session.subscribe(|event| {
//!     if let SessionEvent::ForcedLogout { reason } = event {
//!         eprintln!("session expired: {reason}");
//!     }
//! });
//!
//! let coordinator =
//!     RefreshCoordinator::new(Arc::clone(session.tokens()), Duration::from_secs(30));
//! assert!(!coordinator.is_refreshing());
//! ```

pub mod refresh;
pub mod session;
pub mod token_store;
pub mod traits;
pub mod types;

pub use refresh::RefreshCoordinator;
pub use session::{Session, SessionEvent, SubscriptionId};
pub use token_store::TokenStore;
pub use traits::{RefreshError, TokenRefresher};
pub use types::CredentialPair;
