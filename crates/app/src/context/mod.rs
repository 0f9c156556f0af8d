//! Application context - owns the session and the API client
//!
//! The context is the explicit root of all client state: it opens the
//! configured storage backend, initializes the [`Session`] and hands it to the
//! [`ApiClient`]. Hosts call [`AppContext::shutdown`] when they are done.

use std::sync::Arc;

use privacyguard_common::auth::{Session, SessionEvent, SubscriptionId};
use privacyguard_common::storage::{FileStore, KeyValueStore, MemoryStore};
use privacyguard_domain::{Config, PrivacyGuardError, Result, SessionBackend};
use privacyguard_infra::ApiClient;
use tracing::info;

/// Keychain service name used for the platform backend
pub const KEYCHAIN_SERVICE: &str = "privacyguard";

/// Application context - holds the session and every service built on it
pub struct AppContext {
    pub config: Config,
    pub session: Arc<Session>,
    pub api: ApiClient,
}

impl AppContext {
    /// Open the configured backend and build the client.
    ///
    /// # Errors
    /// Returns `PrivacyGuardError::Storage` if the backend cannot be opened and
    /// `PrivacyGuardError::Config` for an unusable API configuration.
    pub fn new(config: Config) -> Result<Self> {
        let backend = open_backend(&config)?;
        Self::with_backend(config, backend)
    }

    /// Build the context on an already opened backend.
    ///
    /// # Errors
    /// Returns `PrivacyGuardError::Config` for an unusable API configuration.
    pub fn with_backend(config: Config, backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let session = Session::init(backend, &config.session.namespace);
        let api = ApiClient::new(&config.api, Arc::clone(&session))?;

        info!(
            backend = ?config.session.backend,
            base_url = %api.base_url(),
            authenticated = session.is_authenticated(),
            "Application context ready"
        );
        Ok(Self { config, session, api })
    }

    /// Run `notice` with the reason whenever the session is force-logged-out.
    pub fn on_forced_logout<F>(&self, notice: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.session.subscribe(move |event| {
            if let SessionEvent::ForcedLogout { reason } = event {
                notice(reason);
            }
        })
    }

    /// Detach observers. Stored credentials are kept for the next run.
    pub fn shutdown(&self) {
        self.session.teardown();
        info!("Application context shut down");
    }
}

fn open_backend(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match config.session.backend {
        SessionBackend::File => {
            let store = FileStore::open(config.session.path.clone()).map_err(|e| {
                PrivacyGuardError::Storage(format!(
                    "cannot open session file {}: {e}",
                    config.session.path.display()
                ))
            })?;
            Ok(Arc::new(store))
        }
        SessionBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        SessionBackend::Keychain => keychain_backend(),
    }
}

#[cfg(feature = "platform")]
fn keychain_backend() -> Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(privacyguard_common::security::KeychainProvider::new(KEYCHAIN_SERVICE)))
}

#[cfg(not(feature = "platform"))]
fn keychain_backend() -> Result<Arc<dyn KeyValueStore>> {
    Err(PrivacyGuardError::Config(
        "the keychain session backend requires the `platform` feature".into(),
    ))
}
