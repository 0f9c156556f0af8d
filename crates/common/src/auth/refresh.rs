//! Single-flight credential refresh
//!
//! However many requests discover an expired access credential at the same
//! time, only one refresh call reaches the backend. The first caller leads the
//! refresh; everyone arriving while it is in flight queues a oneshot receiver
//! and is released, in arrival order, with the leader's outcome.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::token_store::TokenStore;
use super::traits::{RefreshError, TokenRefresher};

type RefreshOutcome = Result<String, RefreshError>;
type Waiters = Vec<oneshot::Sender<RefreshOutcome>>;

/// Coordinates refresh cycles against one [`TokenStore`].
pub struct RefreshCoordinator {
    store: Arc<TokenStore>,
    timeout: Duration,
    /// `None` while idle, the waiter queue while a refresh is in flight.
    in_flight: Mutex<Option<Waiters>>,
}

/// Role of a caller entering [`RefreshCoordinator::refresh`]
enum Entry {
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
    Settled(String),
}

impl RefreshCoordinator {
    pub fn new(store: Arc<TokenStore>, timeout: Duration) -> Self {
        Self { store, timeout, in_flight: Mutex::new(None) }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Number of callers queued behind the current leader.
    pub fn waiting(&self) -> usize {
        self.in_flight.lock().as_ref().map_or(0, Vec::len)
    }

    /// Obtain a fresh access credential.
    ///
    /// `stale_access` is the credential the caller's rejected request carried.
    /// If the store already holds a different one, a refresh finished after
    /// that request was sent and the current credential is returned directly.
    ///
    /// # Errors
    /// Every caller of one refresh cycle receives the same `RefreshError`.
    /// Nothing is written to the token store on failure, nor when the session
    /// was cleared or replaced while the refresh was in flight
    /// (`RefreshError::Superseded`).
    pub async fn refresh<R>(&self, refresher: &R, stale_access: Option<&str>) -> RefreshOutcome
    where
        R: TokenRefresher + ?Sized,
    {
        match self.enter(stale_access) {
            Entry::Settled(current) => {
                debug!("Access credential already rotated; skipping refresh");
                Ok(current)
            }
            Entry::Waiter(rx) => {
                debug!("Refresh in flight; queued behind leader");
                rx.await.unwrap_or(Err(RefreshError::Abandoned))
            }
            Entry::Leader => {
                let flight = InFlight { coordinator: self, settled: false };
                let outcome = self.run(refresher).await;
                flight.settle(outcome.clone());
                outcome
            }
        }
    }

    fn enter(&self, stale_access: Option<&str>) -> Entry {
        let mut in_flight = self.in_flight.lock();

        if let Some(waiters) = in_flight.as_mut() {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            return Entry::Waiter(rx);
        }

        if let (Some(stale), Some(current)) = (stale_access, self.store.access_credential()) {
            if stale != current {
                return Entry::Settled(current);
            }
        }

        *in_flight = Some(Vec::new());
        Entry::Leader
    }

    async fn run<R>(&self, refresher: &R) -> RefreshOutcome
    where
        R: TokenRefresher + ?Sized,
    {
        let Some((refresh_token, generation)) = self.store.refresh_credential_with_generation()
        else {
            warn!("Refresh requested without a stored refresh credential");
            return Err(RefreshError::MissingRefreshToken);
        };

        let pair = tokio::time::timeout(self.timeout, refresher.refresh(&refresh_token))
            .await
            .map_err(|_| RefreshError::TimedOut(self.timeout))??;

        let access = pair.access_token.clone();
        let stored = self
            .store
            .replace_credentials(pair, generation)
            .map_err(|err| RefreshError::Storage(err.to_string()))?;
        if !stored {
            info!("Session changed during refresh; discarding refreshed credentials");
            return Err(RefreshError::Superseded);
        }

        info!("Credentials refreshed");
        Ok(access)
    }

    fn release(&self, outcome: &RefreshOutcome) {
        let waiters = self.in_flight.lock().take().unwrap_or_default();
        if !waiters.is_empty() {
            debug!(waiters = waiters.len(), ok = outcome.is_ok(), "Releasing refresh waiters");
        }
        for waiter in waiters {
            // A waiter whose request was dropped no longer listens.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Leader-side guard: returns the coordinator to idle even if the leader's
/// future is dropped before the refresh settles.
struct InFlight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, outcome: RefreshOutcome) {
        self.settled = true;
        self.coordinator.release(&outcome);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Refresh leader dropped before completion");
            self.coordinator.release(&Err(RefreshError::Abandoned));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialPair;
    use crate::storage::MemoryStore;
    use crate::testing::MockTokenRefresher;

    fn store_with(pair: Option<CredentialPair>) -> Arc<TokenStore> {
        let store = Arc::new(TokenStore::load(Arc::new(MemoryStore::new()), "test"));
        if let Some(pair) = pair {
            store.set_credentials(pair).unwrap();
        }
        store
    }

    #[tokio::test]
    async fn leader_refreshes_and_stores_pair() {
        let store = store_with(Some(CredentialPair::new("a1", "r1")));
        let coordinator = RefreshCoordinator::new(store.clone(), Duration::from_secs(5));
        let refresher = MockTokenRefresher::new();
        refresher.push_ok(CredentialPair::new("a2", "r2"));

        let access = coordinator.refresh(&refresher, Some("a1")).await.unwrap();

        assert_eq!(access, "a2");
        assert_eq!(store.credentials(), Some(CredentialPair::new("a2", "r2")));
        assert_eq!(refresher.received(), vec!["r1".to_string()]);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn missing_refresh_credential_fails_without_call() {
        let coordinator = RefreshCoordinator::new(store_with(None), Duration::from_secs(5));
        let refresher = MockTokenRefresher::new();

        let err = coordinator.refresh(&refresher, None).await.unwrap_err();

        assert_eq!(err, RefreshError::MissingRefreshToken);
        assert_eq!(refresher.calls(), 0);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn stale_credential_short_circuits() {
        let store = store_with(Some(CredentialPair::new("a2", "r2")));
        let coordinator = RefreshCoordinator::new(store, Duration::from_secs(5));
        let refresher = MockTokenRefresher::new();

        let access = coordinator.refresh(&refresher, Some("a1")).await.unwrap();

        assert_eq!(access, "a2");
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn rejection_leaves_store_untouched() {
        let store = store_with(Some(CredentialPair::new("a1", "r1")));
        let coordinator = RefreshCoordinator::new(store.clone(), Duration::from_secs(5));
        let refresher = MockTokenRefresher::new();
        refresher.push_err(RefreshError::Rejected("invalid refresh token".into()));

        let err = coordinator.refresh(&refresher, Some("a1")).await.unwrap_err();

        assert!(matches!(err, RefreshError::Rejected(_)));
        assert_eq!(store.credentials(), Some(CredentialPair::new("a1", "r1")));
    }

    #[tokio::test]
    async fn logout_during_refresh_discards_new_pair() {
        let store = store_with(Some(CredentialPair::new("a1", "r1")));
        let coordinator = RefreshCoordinator::new(store.clone(), Duration::from_secs(5));
        let refresher = MockTokenRefresher::new().gated();
        refresher.push_ok(CredentialPair::new("a2", "r2"));

        let logout = async {
            refresher.entered().await;
            store.clear();
            refresher.release();
        };
        let (outcome, ()) = tokio::join!(coordinator.refresh(&refresher, Some("a1")), logout);

        assert_eq!(outcome, Err(RefreshError::Superseded));
        assert!(store.credentials().is_none());
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn login_during_refresh_wins_over_refreshed_pair() {
        let store = store_with(Some(CredentialPair::new("a1", "r1")));
        let coordinator = RefreshCoordinator::new(store.clone(), Duration::from_secs(5));
        let refresher = MockTokenRefresher::new().gated();
        refresher.push_ok(CredentialPair::new("a2", "r2"));

        let login = async {
            refresher.entered().await;
            store.set_credentials(CredentialPair::new("b1", "s1")).unwrap();
            refresher.release();
        };
        let (outcome, ()) = tokio::join!(coordinator.refresh(&refresher, Some("a1")), login);

        assert_eq!(outcome, Err(RefreshError::Superseded));
        assert_eq!(store.credentials(), Some(CredentialPair::new("b1", "s1")));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_refresh_times_out() {
        let store = store_with(Some(CredentialPair::new("a1", "r1")));
        let coordinator = RefreshCoordinator::new(store, Duration::from_secs(2));
        let refresher = MockTokenRefresher::new().with_delay(Duration::from_secs(60));
        refresher.push_ok(CredentialPair::new("a2", "r2"));

        let err = coordinator.refresh(&refresher, Some("a1")).await.unwrap_err();

        assert_eq!(err, RefreshError::TimedOut(Duration::from_secs(2)));
        assert!(!coordinator.is_refreshing());
    }
}
