//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::auth::{CredentialPair, RefreshError, TokenRefresher};
use crate::storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};

type Outcome = Result<CredentialPair, RefreshError>;

/// Scripted refresher that never touches the network.
///
/// Outcomes are consumed in push order; once the script runs out every call
/// succeeds with a numbered pair (`refreshed-access-<n>`). Clones share state.
///
/// # Examples
///
/// ```
/// use privacyguard_common::auth::{CredentialPair, RefreshError};
/// use privacyguard_common::testing::MockTokenRefresher;
///
/// let refresher = MockTokenRefresher::new();
/// refresher.push_ok(CredentialPair::new("a2", "r2"));
/// refresher.push_err(RefreshError::Rejected("expired".into()));
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockTokenRefresher {
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    received: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
    entered: Arc<Notify>,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
}

impl MockTokenRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every refresh until [`release`](Self::release) is called.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Sleep before answering each refresh.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_ok(&self, pair: CredentialPair) {
        self.outcomes.lock().push_back(Ok(pair));
    }

    pub fn push_err(&self, err: RefreshError) {
        self.outcomes.lock().push_back(Err(err));
    }

    /// Let one gated refresh proceed. A release issued before the refresh
    /// starts waiting is remembered.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Resolves once a refresh call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh credentials received, in call order.
    #[must_use]
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.received.lock().push(refresh_token.to_string());
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.outcomes.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(CredentialPair::new(
                format!("refreshed-access-{call}"),
                format!("refreshed-refresh-{call}"),
            ))
        })
    }
}

/// In-memory store whose reads or writes can be made to fail.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_partway: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Affects `set`, `set_many`, `remove` and `remove_many`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next `set_many` store its first entry and then fail, leaving a
    /// half-written batch behind. Later writes succeed.
    pub fn fail_next_batch_partway(&self) {
        self.fail_partway.store(true, Ordering::SeqCst);
    }

    /// Inspect the underlying map regardless of failure flags.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(flag: &AtomicBool, op: &str) -> StorageResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable(format!("{op} disabled by test")))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.remove(key)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        Self::check(&self.fail_writes, "write")?;
        if self.fail_partway.swap(false, Ordering::SeqCst) {
            if let Some((key, value)) = entries.first() {
                self.inner.set(key, value)?;
            }
            return Err(StorageError::Unavailable("batch interrupted by test".into()));
        }
        self.inner.set_many(entries)
    }
}
