use robocomp_client::config::{ApiConfig, StorageConfig};
use robocomp_client::{Client, Error, MemoryTokenStore, SessionEvent, Settings, TokenStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server_uri: &str, store: Arc<MemoryTokenStore>) -> Client {
    let settings = Settings {
        environment: "test".to_string(),
        api: ApiConfig {
            base_url: server_uri.to_string(),
            version: "v1".to_string(),
            timeout_seconds: 5,
        },
        storage: StorageConfig {
            credentials_path: "unused".to_string(),
        },
    };
    Client::with_store(&settings, store).expect("Failed to build client")
}

fn auth_payload(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "message": "ok",
        "user": {
            "user_id": "3f2504e0-4f89-11d3-9a0c-0305e82c3301",
            "email": "a@b.com",
            "name": "Ada",
            "role": "PARTICIPANT",
            "team_id": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        },
        "tokens": {
            "access_token": access,
            "refresh_token": refresh,
            "token_type": "bearer"
        }
    })
}

async fn login(server: &MockServer, client: &Client) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_payload("T1", "R1")))
        .mount(server)
        .await;
    client.auth.login("a@b.com", "secret").await.unwrap();
}

fn team_summaries() -> serde_json::Value {
    json!([{
        "team_id": "7f8a6e5e-1111-2222-3333-444455556666",
        "name": "Circuit Breakers",
        "captain_name": "Ada",
        "member_count": 4
    }])
}

#[test_log::test(tokio::test)]
async fn test_rejected_request_is_refreshed_and_retried_once() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let client = test_client(&server.uri(), store.clone());
    login(&server, &client).await;

    // The stale credential is rejected...
    Mock::given(method("GET"))
        .and(path("/api/v1/teams/"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Could not validate credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    // ...the refresh rotates the pair...
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T2",
            "refresh_token": "R2",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // ...and the retried request carries the fresh credential.
    Mock::given(method("GET"))
        .and(path("/api/v1/teams/"))
        .and(header("Authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(team_summaries()))
        .expect(1)
        .mount(&server)
        .await;

    let teams = client.teams.list().await.unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].name, "Circuit Breakers");

    // Rotation is visible in the session and the persisted shadow
    assert_eq!(client.session.access_token().await.as_deref(), Some("T2"));
    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token, "T2");
    assert_eq!(stored.refresh_token, "R2");
}

#[test_log::test(tokio::test)]
async fn test_failed_refresh_expires_session() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let client = test_client(&server.uri(), store.clone());
    login(&server, &client).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/teams/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Could not validate credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid refresh token" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut events = client.gateway.subscribe();

    let result = client.teams.list().await;
    assert!(matches!(result, Err(Error::SessionExpired)));

    // Full credential wipe, and the shell is told to redirect
    let session = client.session.snapshot().await;
    assert!(session.user.is_none());
    assert!(session.access_token.is_none());
    assert!(session.refresh_token.is_none());
    assert!(store.load().await.unwrap().is_none());

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("expected a session event")
        .unwrap();
    assert_eq!(event, SessionEvent::Expired);
}

#[tokio::test]
async fn test_retried_request_fails_without_second_refresh() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let client = test_client(&server.uri(), store.clone());
    login(&server, &client).await;

    // The endpoint rejects both the original and the retried request
    Mock::given(method("GET"))
        .and(path("/api/v1/evaluations/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Not a judge" })),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T2",
            "refresh_token": "R2",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.evaluations.list().await;
    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Not a judge");
        }
        other => panic!("expected API error, got {:?}", other.map(|v| v.len())),
    }

    // The rotated credentials survive; only a failed refresh wipes them
    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token, "T2");
}

#[tokio::test]
async fn test_non_auth_errors_propagate_unchanged() {
    let server = MockServer::start().await;
    let client = test_client(&server.uri(), Arc::new(MemoryTokenStore::new()));
    login(&server, &client).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/teams/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "database unavailable" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client.teams.list().await;
    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected API error, got {:?}", other.map(|v| v.len())),
    }

    // No refresh was triggered; the session is untouched
    assert!(client.session.is_authenticated().await);
    assert_eq!(client.session.access_token().await.as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_concurrent_rejections_share_one_refresh() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let client = test_client(&server.uri(), store.clone());
    login(&server, &client).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/events/"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Could not validate credentials" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/events/"))
        .and(header("Authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T2",
            "refresh_token": "R2",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(client.events.list(), client.events.list());
    assert!(first.is_ok());
    assert!(second.is_ok());

    assert_eq!(client.session.access_token().await.as_deref(), Some("T2"));
}

#[tokio::test]
async fn test_unauthenticated_requests_carry_no_bearer() {
    let server = MockServer::start().await;
    let client = test_client(&server.uri(), Arc::new(MemoryTokenStore::new()));

    // Login itself must not send an Authorization header
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(wiremock::matchers::header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_payload("T1", "R1")))
        .expect(1)
        .mount(&server)
        .await;

    client.auth.login("a@b.com", "secret").await.unwrap();
}
