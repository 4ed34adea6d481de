use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use kheyma_api::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Credential provider that records invalidations
#[derive(Default)]
struct RecordingCredentials {
    token: Mutex<Option<String>>,
    rejected: Mutex<Vec<String>>,
    invalidations: AtomicUsize,
}

impl RecordingCredentials {
    fn with_token(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(token.to_string())),
            rejected: Mutex::new(Vec::new()),
            invalidations: AtomicUsize::new(0),
        })
    }
}

impl CredentialProvider for RecordingCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn invalidate(&self, rejected_token: &str) {
        self.rejected.lock().unwrap().push(rejected_token.to_string());
        *self.token.lock().unwrap() = None;
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

fn client_for(server: &MockServer, credentials: Arc<dyn CredentialProvider>) -> ApiClient {
    let config = ApiConfig::default().with_base_url(&server.uri());
    ApiClient::new(config, credentials).unwrap()
}

#[tokio::test]
async fn test_protected_call_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"email": "nour@kheyma.eg"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, RecordingCredentials::with_token("tok-123"));
    let me = client.me().await.unwrap();

    assert_eq!(me["email"], "nour@kheyma.eg");
}

#[tokio::test]
async fn test_login_posts_credentials_without_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "nour@kheyma.eg", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "fresh",
            "user": {"email": "nour@kheyma.eg", "roles": ["ROLE_USER"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(NoCredentials));
    let response = client
        .login(&LoginRequest {
            email: "nour@kheyma.eg".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();

    assert_eq!(response.token, "fresh");
    assert!(response.user.is_some());

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("Authorization").is_none());
}

#[tokio::test]
async fn test_rejected_token_invalidates_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
        .mount(&server)
        .await;

    let credentials = RecordingCredentials::with_token("stale");
    let client = client_for(&server, credentials.clone());

    let err = client
        .user_transactions(PageQuery::new(0, 10))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::AuthRejected(_)));
    assert_eq!(credentials.invalidations.load(Ordering::SeqCst), 1);
    assert_eq!(*credentials.rejected.lock().unwrap(), vec!["stale".to_string()]);
    assert!(credentials.bearer_token().is_none());
}

#[tokio::test]
async fn test_public_401_does_not_invalidate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        )
        .mount(&server)
        .await;

    let credentials = RecordingCredentials::with_token("still-valid");
    let client = client_for(&server, credentials.clone());

    let err = client
        .login(&LoginRequest {
            email: "nour@kheyma.eg".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.user_message("Login failed"), "Bad credentials");
    assert_eq!(credentials.invalidations.load(Ordering::SeqCst), 0);
    assert_eq!(credentials.bearer_token().as_deref(), Some("still-valid"));
}

#[tokio::test]
async fn test_status_taxonomy_and_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "email": "must be a well-formed email address",
            "password": "size must be between 6 and 64"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/locations/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(NoCredentials));
    let request = RegisterRequest {
        email: "bad".into(),
        password: "x".into(),
        name: "bad".into(),
    };

    match client.register(&request).await.unwrap_err() {
        ApiError::ValidationFailed(payload) => assert_eq!(payload.field_messages().len(), 2),
        other => panic!("unexpected error: {:?}", other),
    }

    let conflict = client.register(&request).await.unwrap_err();
    assert_eq!(conflict.status(), Some(409));

    let missing = client.get_location("missing").await.unwrap_err();
    assert!(matches!(missing, ApiError::Unknown { status: 404, .. }));
    assert!(missing.payload().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = ApiConfig::default().with_base_url(&format!("http://127.0.0.1:{}/api", port));
    let client = ApiClient::new(config, Arc::new(NoCredentials)).unwrap();

    let err = client
        .list_locations(PageQuery::new(0, 6), &LocationSort::default())
        .await
        .unwrap_err();

    assert!(err.is_unreachable());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_listing_and_search_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/public/all"))
        .and(query_param("page", "1"))
        .and(query_param("size", "6"))
        .and(query_param("sortBy", "createdAt"))
        .and(query_param("sortDir", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"id": "loc-1", "title": "Siwa Oasis Camp", "pricePerNight": 900}],
            "totalPages": 2, "totalElements": 7, "first": false, "last": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/locations/search"))
        .and(query_param("q", "white desert"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [], "totalPages": 0, "totalElements": 0, "first": true, "last": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(NoCredentials));

    let page = client
        .list_locations(PageQuery::new(1, 6), &LocationSort::default())
        .await
        .unwrap();
    assert_eq!(page.content[0].price_per_night, Some(900.0));
    assert!(page.last);

    let filters = LocationFilters {
        query: Some("white desert".into()),
        ..Default::default()
    };
    let empty = client
        .search_locations(&filters, PageQuery::new(0, 20))
        .await
        .unwrap();
    assert!(empty.content.is_empty());
}

#[tokio::test]
async fn test_undecodable_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, RecordingCredentials::with_token("tok"));
    let err = client.get_transaction("t-1").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}
