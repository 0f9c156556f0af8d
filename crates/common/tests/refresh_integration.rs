//! Integration tests for refresh coordination
//!
//! Exercises the single-flight refresh protocol against a scripted refresher:
//! one backend call per contention window, one shared outcome for every
//! caller, and no partially written credential pair.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use privacyguard_common::auth::{CredentialPair, RefreshCoordinator, RefreshError, TokenStore};
use privacyguard_common::storage::MemoryStore;
use privacyguard_common::testing::MockTokenRefresher;

fn store_with_pair(access: &str, refresh: &str) -> Arc<TokenStore> {
    let store = Arc::new(TokenStore::load(Arc::new(MemoryStore::new()), "privacyguard"));
    store.set_credentials(CredentialPair::new(access, refresh)).expect("seed credentials");
    store
}

async fn wait_for_waiters(coordinator: &RefreshCoordinator, count: usize) {
    while coordinator.waiting() < count {
        tokio::task::yield_now().await;
    }
}

/// Validates that concurrent callers share a single refresh call.
///
/// # Test Steps
/// 1. Hold the refresh open with a gated refresher
/// 2. Issue five refresh requests concurrently
/// 3. Release the gate once four callers are queued
/// 4. Verify exactly one backend call and the same credential everywhere
#[tokio::test]
async fn test_single_flight_for_concurrent_callers() {
    let store = store_with_pair("a1", "r1");
    let coordinator = RefreshCoordinator::new(Arc::clone(&store), Duration::from_secs(5));
    let refresher = MockTokenRefresher::new().gated();
    refresher.push_ok(CredentialPair::new("a2", "r2"));

    let callers = join_all((0..5).map(|_| coordinator.refresh(&refresher, Some("a1"))));
    let release = async {
        refresher.entered().await;
        wait_for_waiters(&coordinator, 4).await;
        refresher.release();
    };
    let (results, ()) = tokio::join!(callers, release);

    assert_eq!(refresher.calls(), 1);
    assert_eq!(refresher.received(), vec!["r1".to_string()]);
    for result in results {
        assert_eq!(result.expect("refresh should succeed"), "a2");
    }
    assert_eq!(store.credentials(), Some(CredentialPair::new("a2", "r2")));
    assert!(!coordinator.is_refreshing());
}

/// Validates that waiters are released in the order they queued.
#[tokio::test(flavor = "current_thread")]
async fn test_waiters_released_in_arrival_order() {
    let store = store_with_pair("a1", "r1");
    let coordinator =
        Arc::new(RefreshCoordinator::new(Arc::clone(&store), Duration::from_secs(5)));
    let refresher = MockTokenRefresher::new().gated();
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for index in 0..4_usize {
        handles.push(tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            let refresher = refresher.clone();
            let order = Arc::clone(&order);
            async move {
                let result = coordinator.refresh(&refresher, Some("a1")).await;
                order.lock().push(index);
                result
            }
        }));

        if index == 0 {
            refresher.entered().await;
        } else {
            wait_for_waiters(&coordinator, index).await;
        }
    }

    refresher.release();
    for handle in handles {
        handle.await.expect("task panicked").expect("refresh should succeed");
    }

    assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    assert_eq!(refresher.calls(), 1);
}

/// Validates that a failed refresh rejects every caller identically and
/// writes nothing.
#[tokio::test]
async fn test_failure_fans_out_to_every_waiter() {
    let store = store_with_pair("a1", "r1");
    let coordinator = RefreshCoordinator::new(Arc::clone(&store), Duration::from_secs(5));
    let refresher = MockTokenRefresher::new().gated();
    refresher.push_err(RefreshError::Rejected("Invalid refresh token".into()));

    let callers = join_all((0..3).map(|_| coordinator.refresh(&refresher, Some("a1"))));
    let release = async {
        refresher.entered().await;
        wait_for_waiters(&coordinator, 2).await;
        refresher.release();
    };
    let (results, ()) = tokio::join!(callers, release);

    assert_eq!(refresher.calls(), 1);
    for result in results {
        assert_eq!(result, Err(RefreshError::Rejected("Invalid refresh token".into())));
    }
    assert_eq!(store.credentials(), Some(CredentialPair::new("a1", "r1")));
}

/// Validates that no backend call is made without a refresh credential.
#[tokio::test]
async fn test_missing_refresh_credential_short_circuits() {
    let store = Arc::new(TokenStore::load(Arc::new(MemoryStore::new()), "privacyguard"));
    let coordinator = RefreshCoordinator::new(store, Duration::from_secs(5));
    let refresher = MockTokenRefresher::new();

    let results = join_all((0..3).map(|_| coordinator.refresh(&refresher, None))).await;

    assert_eq!(refresher.calls(), 0);
    assert!(results.iter().all(|r| *r == Err(RefreshError::MissingRefreshToken)));
}

/// Validates that dropping the leader mid-refresh releases its waiters.
///
/// # Test Steps
/// 1. Start a gated refresh in a task and queue a second caller behind it
/// 2. Abort the leader task
/// 3. Verify the waiter observes `Abandoned` and the coordinator is idle
/// 4. Verify a later refresh runs normally
#[tokio::test]
async fn test_abandoned_leader_releases_waiters() {
    let store = store_with_pair("a1", "r1");
    let coordinator =
        Arc::new(RefreshCoordinator::new(Arc::clone(&store), Duration::from_secs(5)));
    let refresher = MockTokenRefresher::new().gated();

    let leader = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        let refresher = refresher.clone();
        async move { coordinator.refresh(&refresher, Some("a1")).await }
    });
    refresher.entered().await;

    let waiter = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        let refresher = refresher.clone();
        async move { coordinator.refresh(&refresher, Some("a1")).await }
    });
    wait_for_waiters(&coordinator, 1).await;

    leader.abort();
    let outcome = waiter.await.expect("waiter task panicked");

    assert_eq!(outcome, Err(RefreshError::Abandoned));
    assert!(!coordinator.is_refreshing());
    assert_eq!(store.credentials(), Some(CredentialPair::new("a1", "r1")));

    refresher.release();
    let retried = coordinator.refresh(&refresher, Some("a1")).await.expect("refresh succeeds");
    assert_eq!(retried, "refreshed-access-2");
}

/// Validates that a hung refresh is bounded by the coordinator timeout.
#[tokio::test(start_paused = true)]
async fn test_hung_refresh_times_out_for_all_callers() {
    let store = store_with_pair("a1", "r1");
    let coordinator = RefreshCoordinator::new(Arc::clone(&store), Duration::from_secs(30));
    let refresher = MockTokenRefresher::new().with_delay(Duration::from_secs(3600));

    let results = join_all((0..2).map(|_| coordinator.refresh(&refresher, Some("a1")))).await;

    assert_eq!(refresher.calls(), 1);
    for result in results {
        assert_eq!(result, Err(RefreshError::TimedOut(Duration::from_secs(30))));
    }
    assert_eq!(store.credentials(), Some(CredentialPair::new("a1", "r1")));
}

/// Validates that a logout landing mid-refresh is not undone by the
/// refreshed pair, and that every queued caller learns the session ended.
#[tokio::test]
async fn test_logout_mid_refresh_is_not_undone() {
    let store = store_with_pair("a1", "r1");
    let coordinator = RefreshCoordinator::new(Arc::clone(&store), Duration::from_secs(5));
    let refresher = MockTokenRefresher::new().gated();
    refresher.push_ok(CredentialPair::new("a2", "r2"));

    let callers = join_all((0..3).map(|_| coordinator.refresh(&refresher, Some("a1"))));
    let logout = async {
        refresher.entered().await;
        wait_for_waiters(&coordinator, 2).await;
        store.clear();
        refresher.release();
    };
    let (results, ()) = tokio::join!(callers, logout);

    assert_eq!(refresher.calls(), 1);
    assert!(results.iter().all(|r| *r == Err(RefreshError::Superseded)));
    assert_eq!(store.credentials(), None);
    assert!(!coordinator.is_refreshing());
}

/// Validates that a late caller holding a superseded credential reuses the
/// rotated one instead of refreshing again.
#[tokio::test]
async fn test_late_caller_reuses_rotated_credential() {
    let store = store_with_pair("a1", "r1");
    let coordinator = RefreshCoordinator::new(Arc::clone(&store), Duration::from_secs(5));
    let refresher = MockTokenRefresher::new();
    refresher.push_ok(CredentialPair::new("a2", "r2"));

    let first = coordinator.refresh(&refresher, Some("a1")).await.expect("first refresh");
    let late = coordinator.refresh(&refresher, Some("a1")).await.expect("late caller");

    assert_eq!(first, "a2");
    assert_eq!(late, "a2");
    assert_eq!(refresher.calls(), 1);
}

/// Validates that readers never observe an access credential from one pair
/// next to a refresh credential from another.
#[test]
fn test_concurrent_readers_see_whole_pairs() {
    let store = store_with_pair("access-0", "refresh-0");

    let writer = {
        let store = Arc::clone(&store);
        std::thread::spawn(move || {
            for generation in 1..500 {
                store
                    .set_credentials(CredentialPair::new(
                        format!("access-{generation}"),
                        format!("refresh-{generation}"),
                    ))
                    .expect("write pair");
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    let pair = store.credentials().expect("pair always present");
                    let access = pair.access_token.trim_start_matches("access-");
                    let refresh = pair.refresh_token.trim_start_matches("refresh-");
                    assert_eq!(access, refresh);
                }
            })
        })
        .collect();

    writer.join().expect("writer panicked");
    for reader in readers {
        reader.join().expect("reader panicked");
    }
}
