use std::sync::Arc;
use std::time::Duration;

use kheyma_api::{ApiConfig, PageQuery, ProfileUpdate};
use serde_json::json;
use session_services::store::{IDENTITY_KEY, TOKEN_KEY};
use session_services::*;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    manager: SessionManager,
    store: Arc<MemoryStore>,
    history: Arc<RouteHistory>,
}

fn harness(server: &MockServer) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let history = Arc::new(RouteHistory::new());
    let config = ApiConfig::default().with_base_url(&server.uri());
    let manager = SessionManager::connect(config, store.clone(), history.clone()).unwrap();
    Harness {
        manager,
        store,
        history,
    }
}

fn persist(store: &MemoryStore, token: &str, identity: serde_json::Value) {
    store.set(TOKEN_KEY, token).unwrap();
    store.set(IDENTITY_KEY, &identity.to_string()).unwrap();
}

fn assert_no_orphan_identity(state: &SessionState) {
    if state.identity().is_some() {
        assert!(state.token().is_some());
    }
}

async fn mount_login(server: &MockServer, roles: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-login",
            "expiration": 86400000,
            "user": {"id": "u-1", "email": "omar@kheyma.eg", "name": "Omar", "roles": roles}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_establishes_and_persists_session() {
    let server = MockServer::start().await;
    mount_login(&server, json!(["ROLE_ADMIN", "ROLE_USER"])).await;
    let h = harness(&server);
    h.manager.bootstrap().await;

    let role = h.manager.login("omar@kheyma.eg", "secret").await.unwrap();

    assert_eq!(role, Role::Admin);
    assert_eq!(Route::after_login(role), Route::AdminDashboard);

    let state = h.manager.state();
    assert!(state.is_authenticated());
    assert_eq!(state.token(), Some("tok-login"));
    assert_eq!(state.identity().unwrap().name.as_deref(), Some("Omar"));

    assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-login"));
    assert!(h.store.get(IDENTITY_KEY).unwrap().unwrap().contains("\"role\":\"ADMIN\""));
}

#[tokio::test]
async fn test_failed_login_leaves_state_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        )
        .mount(&server)
        .await;
    let h = harness(&server);
    h.manager.bootstrap().await;

    let err = h.manager.login("omar@kheyma.eg", "wrong").await.unwrap_err();

    assert_eq!(err, AuthFailure::Rejected("Bad credentials".into()));
    assert!(h.manager.state().is_anonymous());
    assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    assert!(h.history.entries().is_empty());
}

#[tokio::test]
async fn test_login_requires_fields_without_calling_backend() {
    let server = MockServer::start().await;
    let h = harness(&server);

    let err = h.manager.login("  ", "").await.unwrap_err();

    assert!(matches!(err, AuthFailure::Invalid(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_defaults_name_to_email_local_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_partial_json(json!({"email": "layla@kheyma.eg", "name": "layla"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "tok-new",
            "user": {"email": "layla@kheyma.eg", "name": "layla", "roles": ["ROLE_USER"]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server);

    let role = h
        .manager
        .register("layla@kheyma.eg", "secret1", None)
        .await
        .unwrap();

    assert_eq!(role, Role::User);
    assert_eq!(h.manager.state().token(), Some("tok-new"));
}

#[tokio::test]
async fn test_register_supplied_name_overrides_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "tok-new",
            "user": {"email": "layla@kheyma.eg", "roles": ["ROLE_USER"]}
        })))
        .mount(&server)
        .await;
    let h = harness(&server);

    h.manager
        .register("layla@kheyma.eg", "secret1", Some("Layla Hassan"))
        .await
        .unwrap();

    let state = h.manager.state();
    assert_eq!(
        state.identity().unwrap().name.as_deref(),
        Some("Layla Hassan")
    );
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "Email already exists"})),
        )
        .mount(&server)
        .await;
    let h = harness(&server);

    let err = h
        .manager
        .register("taken@kheyma.eg", "secret1", None)
        .await
        .unwrap_err();

    assert_eq!(err, AuthFailure::DuplicateEmail);
    assert_eq!(h.manager.state().token(), None);
}

#[tokio::test]
async fn test_bootstrap_without_persisted_session() {
    let server = MockServer::start().await;
    let h = harness(&server);
    assert!(h.manager.state().is_loading());

    let state = h.manager.bootstrap().await;

    assert!(state.is_anonymous());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bootstrap_validates_persisted_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer tok-saved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "omar@kheyma.eg", "name": "Omar K", "roles": ["ROLE_USER"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server);
    persist(
        &h.store,
        "tok-saved",
        json!({"email": "omar@kheyma.eg", "name": "Omar", "role": "USER"}),
    );

    let state = h.manager.bootstrap().await;

    assert!(state.is_authenticated());
    assert_eq!(state.token(), Some("tok-saved"));
    assert_eq!(state.identity().unwrap().name.as_deref(), Some("Omar K"));
    assert!(h.store.get(IDENTITY_KEY).unwrap().unwrap().contains("Omar K"));
}

#[tokio::test]
async fn test_bootstrap_purges_rejected_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "User not found"})))
        .mount(&server)
        .await;
    let h = harness(&server);
    persist(&h.store, "tok-old", json!({"email": "gone@kheyma.eg", "type": "USER"}));

    let state = h.manager.bootstrap().await;

    assert!(state.is_anonymous());
    assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(h.store.get(IDENTITY_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_bootstrap_with_expired_token_redirects_to_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer tok-expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server);
    persist(&h.store, "tok-expired", json!({"email": "omar@kheyma.eg", "roles": ["ROLE_USER"]}));

    let state = h.manager.bootstrap().await;

    assert!(state.is_anonymous());
    assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(h.store.get(IDENTITY_KEY).unwrap(), None);
    assert_eq!(h.history.entries(), vec![Route::Login]);
}

#[tokio::test]
async fn test_login_during_bootstrap_survives_late_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer tok-old"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    mount_login(&server, json!(["ROLE_USER"])).await;
    let h = harness(&server);
    persist(&h.store, "tok-old", json!({"email": "omar@kheyma.eg", "roles": ["ROLE_USER"]}));

    let login = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.manager.login("omar@kheyma.eg", "secret").await
    };
    let (state, role) = tokio::join!(h.manager.bootstrap(), login);

    assert_eq!(role, Ok(Role::User));
    assert_eq!(state.token(), Some("tok-login"));
    assert!(h.manager.state().is_authenticated());
    assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-login"));
    assert!(h.history.entries().is_empty());
}

#[tokio::test]
async fn test_bootstrap_runs_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "omar@kheyma.eg"})))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server);
    persist(&h.store, "tok-saved", json!({"email": "omar@kheyma.eg", "role": "USER"}));

    h.manager.bootstrap().await;
    h.manager.logout();
    let again = h.manager.bootstrap().await;

    assert!(again.is_anonymous());
}

#[tokio::test]
async fn test_rejected_token_clears_session_and_redirects() {
    let server = MockServer::start().await;
    mount_login(&server, json!(["ROLE_USER"])).await;
    Mock::given(method("GET"))
        .and(path("/transactions/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let h = harness(&server);
    h.manager.bootstrap().await;
    h.manager.login("omar@kheyma.eg", "secret").await.unwrap();

    let err = h
        .manager
        .api()
        .user_transactions(PageQuery::new(0, 10))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    let state = h.manager.state();
    assert_eq!(state.token(), None);
    assert_no_orphan_identity(&state);
    assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(h.history.current(), Some(Route::Login));
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let server = MockServer::start().await;
    mount_login(&server, json!(["ROLE_USER"])).await;
    let h = harness(&server);
    h.manager.bootstrap().await;

    h.manager.logout();
    assert!(h.manager.state().is_anonymous());

    h.manager.login("omar@kheyma.eg", "secret").await.unwrap();
    h.manager.logout();
    h.manager.logout();

    let state = h.manager.state();
    assert_eq!(state.token(), None);
    assert_eq!(state.identity(), None);
    assert_eq!(h.store.get(IDENTITY_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_update_identity_applies_after_response() {
    let server = MockServer::start().await;
    mount_login(&server, json!(["ROLE_USER"])).await;
    Mock::given(method("PUT"))
        .and(path("/auth/me"))
        .and(body_partial_json(json!({"name": "Omar Khaled"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "omar@kheyma.eg", "name": "Omar Khaled", "roles": ["ROLE_USER"]
        })))
        .mount(&server)
        .await;
    let h = harness(&server);
    h.manager.bootstrap().await;
    h.manager.login("omar@kheyma.eg", "secret").await.unwrap();

    let mut changes = h.manager.subscribe();
    changes.borrow_and_update();

    let update = ProfileUpdate {
        name: Some("Omar Khaled".into()),
        ..Default::default()
    };
    let identity = h.manager.update_identity(&update).await.unwrap();

    assert_eq!(identity.name.as_deref(), Some("Omar Khaled"));
    assert!(changes.has_changed().unwrap());
    assert_eq!(
        h.manager.state().identity().unwrap().name.as_deref(),
        Some("Omar Khaled")
    );
    assert_eq!(h.manager.state().token(), Some("tok-login"));
}

#[tokio::test]
async fn test_update_identity_failure_keeps_identity() {
    let server = MockServer::start().await;
    mount_login(&server, json!(["ROLE_USER"])).await;
    Mock::given(method("PUT"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid age"})))
        .mount(&server)
        .await;
    let h = harness(&server);
    h.manager.bootstrap().await;
    h.manager.login("omar@kheyma.eg", "secret").await.unwrap();

    let update = ProfileUpdate {
        age: Some(3),
        ..Default::default()
    };
    let err = h.manager.update_identity(&update).await.unwrap_err();

    assert_eq!(err, AuthFailure::Rejected("Invalid age".into()));
    assert_eq!(
        h.manager.state().identity().unwrap().name.as_deref(),
        Some("Omar")
    );
}

#[tokio::test]
async fn test_refresh_replaces_token() {
    let server = MockServer::start().await;
    mount_login(&server, json!(["ROLE_USER"])).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("Authorization", "Bearer tok-login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-refreshed",
            "user": {"email": "omar@kheyma.eg", "roles": ["ROLE_USER"]}
        })))
        .mount(&server)
        .await;
    let h = harness(&server);
    h.manager.bootstrap().await;
    h.manager.login("omar@kheyma.eg", "secret").await.unwrap();

    h.manager.refresh().await.unwrap();

    assert_eq!(h.manager.state().token(), Some("tok-refreshed"));
    assert_eq!(
        h.store.get(TOKEN_KEY).unwrap().as_deref(),
        Some("tok-refreshed")
    );
}
