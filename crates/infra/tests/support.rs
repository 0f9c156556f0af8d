#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use privacyguard_common::auth::{CredentialPair, Session, SessionEvent};
use privacyguard_common::storage::{KeyValueStore, MemoryStore};
use privacyguard_domain::ApiConfig;
use privacyguard_infra::ApiClient;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const NAMESPACE: &str = "privacyguard";

/// Client wired to a mock backend with an in-memory session.
pub struct TestHarness {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub client: ApiClient,
    pub events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl TestHarness {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Like [`TestHarness::start`], with `configure` applied to the API
    /// settings before the client is built.
    pub async fn start_with(configure: impl FnOnce(&mut ApiConfig)) -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let session = Session::init(store.clone() as Arc<dyn KeyValueStore>, NAMESPACE);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        session.subscribe(move |event: &SessionEvent| sink.lock().push(event.clone()));

        let mut config = ApiConfig { base_url: server.uri(), ..ApiConfig::default() };
        configure(&mut config);
        let client = ApiClient::new(&config, session).expect("api client should build");

        Self { server, store, client, events }
    }

    /// Harness that already holds `access`/`refresh`.
    pub async fn logged_in(access: &str, refresh: &str) -> Self {
        let harness = Self::start().await;
        harness
            .client
            .session()
            .tokens()
            .set_credentials(CredentialPair::new(access, refresh))
            .expect("credentials should persist");
        harness
    }

    pub fn session(&self) -> &Arc<Session> {
        self.client.session()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    pub fn forced_logouts(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, SessionEvent::ForcedLogout { .. })).count()
    }

    pub fn persisted(&self, suffix: &str) -> Option<String> {
        self.store.get(&format!("{NAMESPACE}_{suffix}")).expect("memory store never fails")
    }
}

pub fn tokens(access: &str, refresh: &str) -> Value {
    json!({ "access_token": access, "refresh_token": refresh, "token_type": "bearer" })
}

pub fn user(id: i64, role: &str) -> Value {
    json!({ "id": id, "username": format!("user{id}"), "email": format!("user{id}@example.com"), "role": role })
}

pub fn media(id: i64) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "original_url": format!("https://storage.example/original/{id}.jpg"),
        "processed_url": format!("https://storage.example/processed/{id}.jpg"),
        "processed": true,
        "description": "Processed with faces and license plates"
    })
}
