//! Session lifecycle and observers
//!
//! A `Session` is created once by the host, shared by handle with the API
//! client, and torn down explicitly. It owns the token store and the list of
//! observers notified on login, logout and forced logout.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use privacyguard_domain::User;
use tracing::{debug, info, warn};

use super::token_store::TokenStore;
use super::types::CredentialPair;
use crate::storage::{KeyValueStore, StorageResult};

/// Session state transitions observers are told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    /// The session could not be recovered and was cleared
    ForcedLogout { reason: String },
}

/// Handle returned by [`Session::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

pub struct Session {
    tokens: Arc<TokenStore>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Session {
    /// Load the session stored under `namespace` in `backend`.
    pub fn init(backend: Arc<dyn KeyValueStore>, namespace: &str) -> Arc<Self> {
        let tokens = Arc::new(TokenStore::load(backend, namespace));
        info!(namespace, authenticated = tokens.has_credentials(), "Session initialized");
        Arc::new(Self {
            tokens,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.has_credentials()
    }

    pub fn credentials(&self) -> Option<CredentialPair> {
        self.tokens.credentials()
    }

    pub fn cached_profile(&self) -> Option<User> {
        self.tokens.cached_profile()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if self.is_closed() {
            debug!("Subscription on a closed session ignored");
            return id;
        }
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Deliver `event` to every observer, in subscription order.
    pub fn notify(&self, event: &SessionEvent) {
        // Snapshot so listeners may (un)subscribe without deadlocking.
        let listeners: Vec<Listener> =
            self.listeners.lock().iter().map(|(_, listener)| Arc::clone(listener)).collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Replace whatever session is held with `pair` and announce the login.
    ///
    /// # Errors
    /// Returns the storage error if the pair could not be persisted; the
    /// session is left logged out in that case.
    pub fn establish(&self, pair: CredentialPair) -> StorageResult<()> {
        self.tokens.clear();
        self.tokens.set_credentials(pair)?;
        info!("Session established");
        self.notify(&SessionEvent::LoggedIn);
        Ok(())
    }

    /// Explicit local logout.
    pub fn logout(&self) {
        self.tokens.clear();
        info!("Session logged out");
        self.notify(&SessionEvent::LoggedOut);
    }

    /// Terminal recovery: clear everything, then tell observers.
    pub fn force_logout(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.tokens.clear();
        warn!(%reason, "Forced logout");
        self.notify(&SessionEvent::ForcedLogout { reason });
    }

    /// Drop every observer and mark the session closed. Stored credentials
    /// are kept so the next `init` resumes them.
    pub fn teardown(&self) {
        self.closed.store(true, Ordering::Release);
        let dropped = {
            let mut listeners = self.listeners.lock();
            std::mem::take(&mut *listeners).len()
        };
        debug!(observers = dropped, "Session torn down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("observers", &self.listeners.lock().len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
