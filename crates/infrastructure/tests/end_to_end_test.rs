//! The full client stack against a mock backend over real HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use classdesk_application::auth::{AuthService, TokenStore};
use classdesk_application::client::ApiClient;
use classdesk_application::error::{ApiError, SESSION_EXPIRED_MESSAGE};
use classdesk_domain::auth::Credentials;
use classdesk_domain::session::Session;
use classdesk_domain::{ClientSettings, Notification, User};
use classdesk_infrastructure::{
    ChannelNotifier, MemorySessionStorage, ReqwestTransport, WatchLoginRedirect,
};
use futures::future::join_all;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    client: Arc<ApiClient>,
    storage: Arc<MemorySessionStorage>,
    notifications: broadcast::Receiver<Notification>,
    redirect: WatchLoginRedirect,
}

fn stack(server: &MockServer) -> Stack {
    let settings = ClientSettings {
        base_url: format!("{}/api/v1", server.uri()),
        timeout_ms: 5_000,
        ..ClientSettings::default()
    };
    let storage = Arc::new(MemorySessionStorage::new());
    let notifier = ChannelNotifier::default();
    let notifications = notifier.subscribe();
    let redirect = WatchLoginRedirect::new(settings.login_redirect.clone());

    let transport = Arc::new(ReqwestTransport::new(&settings).unwrap());
    let store = Arc::new(TokenStore::new(storage.clone()));
    let client = ApiClient::builder(transport, store)
        .settings(settings)
        .notifier(Arc::new(notifier))
        .login_redirect(Arc::new(redirect.clone()))
        .build()
        .unwrap();

    Stack {
        client: Arc::new(client),
        storage,
        notifications,
        redirect,
    }
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({"email": "a@b.com", "password": "x"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "refresh_token": "R1",
            "token_type": "bearer",
            "user": {"id": "1", "email": "a@b.com"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_expired(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", "Bearer T1"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token has expired"})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_then_transparent_refresh() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_expired(&server, "/api/v1/students").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(json!({"refresh_token": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T2"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/students"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "s1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let stack = stack(&server);
    let auth = AuthService::new(stack.client.clone());

    auth.login(&Credentials::new("a@b.com", "x")).await.unwrap();
    assert!(stack.client.store().is_authenticated().await);

    let students: Value = stack.client.get("/students").await.unwrap();
    assert_eq!(students, json!([{"id": "s1"}]));

    let restored = TokenStore::rehydrate(stack.storage.clone()).await;
    assert_eq!(restored.access_token().await.as_deref(), Some("T2"));
    assert_eq!(restored.refresh_token().await.as_deref(), Some("R1"));
    assert!(!stack.redirect.requested());
}

#[tokio::test]
async fn test_concurrent_requests_share_one_refresh_over_http() {
    let server = MockServer::start().await;
    mount_expired(&server, "/api/v1/classes").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "T2", "refresh_token": "R2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/classes"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(6)
        .mount(&server)
        .await;

    let stack = stack(&server);
    stack
        .client
        .store()
        .login(User::new("1", "a@b.com"), "T1".into(), "R1".into())
        .await;

    let results = join_all((0..6).map(|_| stack.client.get::<Value>("/classes"))).await;

    assert!(results.iter().all(Result::is_ok), "{results:?}");
    assert_eq!(stack.client.refresh_count(), 1);
    assert_eq!(
        stack.client.store().refresh_token().await.as_deref(),
        Some("R2")
    );
}

#[tokio::test]
async fn test_revoked_refresh_token_ends_session() {
    let server = MockServer::start().await;
    mount_expired(&server, "/api/v1/fees").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid refresh token"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut stack = stack(&server);
    stack
        .client
        .store()
        .login(User::new("1", "a@b.com"), "T1".into(), "R1".into())
        .await;

    let error = stack.client.get::<Value>("/fees").await.unwrap_err();

    assert!(matches!(error, ApiError::AuthorizationFailed { .. }));
    assert!(error.to_string().contains("Invalid refresh token"));
    assert_eq!(stack.client.store().snapshot().await, Session::default());
    assert!(stack.storage.keys().is_empty());
    assert!(stack.redirect.requested());
    assert_eq!(
        stack.notifications.recv().await.unwrap(),
        Notification::error(SESSION_EXPIRED_MESSAGE)
    );
}

#[tokio::test]
async fn test_current_user_updates_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "email": "a@b.com",
            "first_name": "Ada",
            "school_id": 7,
            "roles": ["school_admin"]
        })))
        .mount(&server)
        .await;

    let stack = stack(&server);
    stack
        .client
        .store()
        .login(User::new("1", "a@b.com"), "T1".into(), "R1".into())
        .await;
    let auth = AuthService::new(stack.client.clone());

    let user = auth.current_user().await.unwrap();

    assert_eq!(user.school_id.as_deref(), Some("7"));
    let stored = stack.client.store().user().await.unwrap();
    assert_eq!(stored.display_name(), "Ada");
    assert_eq!(stored.roles, vec!["school_admin".to_string()]);
}

#[tokio::test]
async fn test_logout_notifies_and_clears() {
    let server = MockServer::start().await;
    let mut stack = stack(&server);
    stack
        .client
        .store()
        .login(User::new("1", "a@b.com"), "T1".into(), "R1".into())
        .await;

    AuthService::new(stack.client.clone()).logout().await;

    assert!(!stack.client.store().is_authenticated().await);
    assert!(stack.storage.keys().is_empty());
    assert_eq!(
        stack.notifications.recv().await.unwrap(),
        Notification::success("Logged out successfully")
    );
}
