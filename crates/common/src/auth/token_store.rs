//! Token store
//!
//! Durable home of the credential pair and the cached profile:
//! - Loaded from a [`KeyValueStore`] once, then served from memory
//! - Whole-pair writes and whole-state clears only
//! - A partially persisted pair is treated as no session
//! - The cached profile never outlives the pair it was fetched under
//! - Every pair change or clear bumps a generation counter, so a write
//!   computed against an older session can be refused

use std::sync::Arc;

use parking_lot::RwLock;
use privacyguard_domain::constants::{
    ACCESS_TOKEN_KEY_SUFFIX, REFRESH_TOKEN_KEY_SUFFIX, USER_KEY_SUFFIX,
};
use privacyguard_domain::User;
use tracing::{debug, info, warn};

use super::types::CredentialPair;
use crate::storage::{KeyValueStore, StorageResult};

/// Persisted key names for one namespace
#[derive(Debug, Clone)]
struct StoreKeys {
    access: String,
    refresh: String,
    user: String,
}

impl StoreKeys {
    fn new(namespace: &str) -> Self {
        Self {
            access: format!("{namespace}_{ACCESS_TOKEN_KEY_SUFFIX}"),
            refresh: format!("{namespace}_{REFRESH_TOKEN_KEY_SUFFIX}"),
            user: format!("{namespace}_{USER_KEY_SUFFIX}"),
        }
    }

    fn all(&self) -> [&str; 3] {
        [&self.access, &self.refresh, &self.user]
    }
}

#[derive(Debug, Default)]
struct StoreState {
    credentials: Option<CredentialPair>,
    profile: Option<User>,
    generation: u64,
}

/// Session-wide credential and profile storage
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    keys: StoreKeys,
    state: RwLock<StoreState>,
}

impl TokenStore {
    /// Load whatever session the backend holds under `namespace`.
    ///
    /// Read failures, partial pairs and unreadable profiles are logged and
    /// treated as "no session"; loading itself never fails.
    pub fn load(backend: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        let keys = StoreKeys::new(namespace);
        let state = Self::read_state(backend.as_ref(), &keys);

        if state.credentials.is_some() {
            info!(namespace, "Token store loaded existing session");
        } else {
            debug!(namespace, "Token store loaded without a session");
        }

        Self { backend, keys, state: RwLock::new(state) }
    }

    fn read_state(backend: &dyn KeyValueStore, keys: &StoreKeys) -> StoreState {
        let read = |key: &str| match backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "failed to read session key");
                None
            }
        };

        let credentials = match (read(&keys.access), read(&keys.refresh)) {
            (Some(access), Some(refresh)) => Some(CredentialPair::new(access, refresh)),
            (None, None) => None,
            _ => {
                warn!("discarding partially stored credential pair");
                if let Err(err) = backend.remove_many(&keys.all()) {
                    warn!(error = %err, "failed to remove partial credential pair");
                }
                None
            }
        };

        let profile = match read(&keys.user) {
            Some(_) if credentials.is_none() => {
                let _ = backend.remove(&keys.user);
                None
            }
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!(error = %err, "discarding unreadable cached profile");
                    let _ = backend.remove(&keys.user);
                    None
                }
            },
            None => None,
        };

        StoreState { credentials, profile, generation: 0 }
    }

    pub fn access_credential(&self) -> Option<String> {
        self.state.read().credentials.as_ref().map(|pair| pair.access_token.clone())
    }

    pub fn refresh_credential(&self) -> Option<String> {
        self.state.read().credentials.as_ref().map(|pair| pair.refresh_token.clone())
    }

    /// Both credentials as one consistent snapshot.
    pub fn credentials(&self) -> Option<CredentialPair> {
        self.state.read().credentials.clone()
    }

    pub fn has_credentials(&self) -> bool {
        self.state.read().credentials.is_some()
    }

    /// Current generation; changes whenever the pair is replaced or cleared.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Refresh credential together with the generation it belongs to.
    pub fn refresh_credential_with_generation(&self) -> Option<(String, u64)> {
        let state = self.state.read();
        state.credentials.as_ref().map(|pair| (pair.refresh_token.clone(), state.generation))
    }

    /// Replace the stored pair.
    ///
    /// Both keys are persisted in one batch before the in-memory pair changes.
    /// On failure the previously persisted pair is written back (or the keys
    /// removed when there was none) and the in-memory pair stays in place.
    ///
    /// # Errors
    /// Returns the backend error if the pair could not be persisted.
    pub fn set_credentials(&self, pair: CredentialPair) -> StorageResult<()> {
        let mut state = self.state.write();
        self.write_pair(&mut state, pair)
    }

    /// Replace the stored pair only if nothing replaced or cleared it since
    /// `generation` was observed.
    ///
    /// Returns `Ok(false)` without touching the backend when the session moved
    /// on, e.g. a logout landed while a refresh was in flight.
    ///
    /// # Errors
    /// Returns the backend error if the pair could not be persisted.
    pub fn replace_credentials(
        &self,
        pair: CredentialPair,
        generation: u64,
    ) -> StorageResult<bool> {
        let mut state = self.state.write();
        if state.generation != generation {
            debug!(
                expected = generation,
                current = state.generation,
                "Discarding pair for a superseded session"
            );
            return Ok(false);
        }
        self.write_pair(&mut state, pair)?;
        Ok(true)
    }

    fn write_pair(&self, state: &mut StoreState, pair: CredentialPair) -> StorageResult<()> {
        let persisted = self.backend.set_many(&[
            (&self.keys.access, &pair.access_token),
            (&self.keys.refresh, &pair.refresh_token),
        ]);

        if let Err(err) = persisted {
            warn!(error = %err, "failed to persist credential pair; rolling back");
            let rollback = match &state.credentials {
                Some(previous) => self.backend.set_many(&[
                    (&self.keys.access, &previous.access_token),
                    (&self.keys.refresh, &previous.refresh_token),
                ]),
                None => self.backend.remove_many(&[&self.keys.access, &self.keys.refresh]),
            };
            if let Err(rollback) = rollback {
                warn!(error = %rollback, "credential rollback failed");
            }
            return Err(err);
        }

        state.credentials = Some(pair);
        state.generation += 1;
        debug!(generation = state.generation, "Credential pair stored");
        Ok(())
    }

    pub fn cached_profile(&self) -> Option<User> {
        self.state.read().profile.clone()
    }

    /// Best-effort profile cache.
    ///
    /// Ignored while no credential pair is held; persistence failures are
    /// logged, the in-memory copy is kept.
    pub fn set_cached_profile(&self, profile: &User) {
        let mut state = self.state.write();
        if state.credentials.is_none() {
            debug!("Skipping profile cache: no active credentials");
            return;
        }

        match serde_json::to_string(profile) {
            Ok(raw) => {
                if let Err(err) = self.backend.set(&self.keys.user, &raw) {
                    warn!(error = %err, "failed to persist cached profile");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize cached profile"),
        }

        state.profile = Some(profile.clone());
    }

    /// Remove both credentials and the cached profile. Idempotent.
    pub fn clear(&self) {
        let mut state = self.state.write();
        let generation = state.generation + 1;
        *state = StoreState { generation, ..StoreState::default() };

        if let Err(err) = self.backend.remove_many(&self.keys.all()) {
            warn!(error = %err, "failed to remove persisted session keys");
        }
        debug!("Token store cleared");
    }
}
