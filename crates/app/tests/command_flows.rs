//! End-to-end command tests against a mock backend

use std::sync::Arc;

use privacyguard_common::auth::CredentialPair;
use privacyguard_common::storage::MemoryStore;
use privacyguard_domain::{ApiConfig, CensorOptions, Config, PrivacyGuardError, Role};
use privacyguard_lib::commands::{auth, media, users};
use privacyguard_lib::context::AppContext;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn context_for(server: &MockServer) -> AppContext {
    let config = Config {
        api: ApiConfig { base_url: server.uri(), ..ApiConfig::default() },
        ..Config::default()
    };
    AppContext::with_backend(config, Arc::new(MemoryStore::new())).expect("context should build")
}

fn profile(role: &str) -> serde_json::Value {
    json!({ "id": 1, "username": "ana", "email": "ana@example.com", "role": role })
}

fn media_item(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": 1,
        "original_url": "https://bucket.example/uploads/street.jpg",
        "processed_url": "https://bucket.example/processed/street.jpg",
        "processed": true,
        "description": "Processed with faces and license plates"
    })
}

#[tokio::test]
async fn login_returns_cached_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A1", "refresh_token": "R1", "token_type": "bearer"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile("user")))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server);
    let user = auth::login(&ctx, "ana@example.com".into(), "secret".into()).await.unwrap();

    assert_eq!(user.username, "ana");
    assert_eq!(user.role, Role::User);
    assert!(ctx.session.is_authenticated());
}

#[tokio::test]
async fn upload_sends_censor_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/media/upload"))
        .and(query_param("description", "Processed with license plates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(media_item(4)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("street.jpg");
    std::fs::write(&file, b"jpeg-bytes").unwrap();

    let ctx = context_for(&server);
    ctx.session.establish(CredentialPair::new("A1", "R1")).unwrap();
    let item = media::upload_media(&ctx, &file, CensorOptions { faces: false, plates: true })
        .await
        .unwrap();

    assert_eq!(item.id, 4);
}

#[tokio::test]
async fn upload_without_targets_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = context_for(&server);
    let err = media::upload_media(
        &ctx,
        std::path::Path::new("street.jpg"),
        CensorOptions { faces: false, plates: false },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PrivacyGuardError::InvalidInput(_)));
}

#[tokio::test]
async fn download_saves_censored_copy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/media/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(media_item(4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/media/4/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"blurred".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = context_for(&server);
    ctx.session.establish(CredentialPair::new("A1", "R1")).unwrap();

    let saved = media::download_media(&ctx, 4, dir.path()).await.unwrap();

    assert_eq!(saved, dir.path().join("censored_street.jpg"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"blurred");
}

#[tokio::test]
async fn non_admin_profile_skips_admin_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = context_for(&server);
    ctx.session.establish(CredentialPair::new("A1", "R1")).unwrap();
    let profile = serde_json::from_value(profile("user")).unwrap();
    ctx.session.tokens().set_cached_profile(&profile);

    let err = users::list_users(&ctx).await.unwrap_err();

    assert!(matches!(err, PrivacyGuardError::Auth(msg) if msg.contains("not an administrator")));
}

#[tokio::test]
async fn session_expiry_reaches_forced_logout_observer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/media/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token expired" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid refresh token" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context_for(&server);
    ctx.session.establish(CredentialPair::new("A1", "R1")).unwrap();
    let notices = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&notices);
    ctx.on_forced_logout(move |reason| sink.lock().push(reason.to_string()));

    let err = media::list_media(&ctx).await.unwrap_err();

    assert!(matches!(err, PrivacyGuardError::Auth(_)));
    assert_eq!(notices.lock().len(), 1);
    assert!(!ctx.session.is_authenticated());
}
