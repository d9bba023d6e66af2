//! Shared helpers for the API integration tests.
//!
//! Every test builds its own [`AppState`] over the in-memory store backend
//! and drives the real router (same middleware stack as production) with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use docflow_api::auth::jwt::JwtConfig;
use docflow_api::auth::password::hash_password;
use docflow_api::config::{ServerConfig, StorageBackend};
use docflow_api::notifications::NotificationRouter;
use docflow_api::router::build_app_router;
use docflow_api::state::AppState;
use docflow_api::ws::WsManager;
use docflow_core::roles::{ROLE_ADMIN, ROLE_USER};
use docflow_db::models::user::{CreateUser, User};
use docflow_db::Stores;
use docflow_events::EventBus;

pub const TEST_PASSWORD: &str = "test_password_123";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as both the app URL and the CORS origin.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        app_url: "http://localhost:5173".to_string(),
        storage_backend: StorageBackend::Memory,
        database_url: None,
        jwt: JwtConfig {
            secret: "integration-test-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Fresh application state over empty in-memory stores, without a mailer.
pub fn test_state() -> AppState {
    AppState {
        config: Arc::new(test_config()),
        stores: Stores::in_memory(),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::new(EventBus::default()),
        mailer: None,
    }
}

/// Build the full application router for `state`.
pub fn build_test_app(state: AppState) -> Router {
    build_app_router(state, &test_config())
}

/// Spawn the notification router the way `main.rs` does.
pub fn spawn_notification_router(state: &AppState) -> tokio::task::JoinHandle<()> {
    let router = NotificationRouter::new(
        Arc::clone(&state.stores.notifications),
        Arc::clone(&state.ws_manager),
    );
    tokio::spawn(router.run(state.event_bus.subscribe()))
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Insert a user directly into the store with [`TEST_PASSWORD`].
pub async fn create_user(state: &AppState, email: &str, role: &str) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    state
        .stores
        .users
        .create(&CreateUser {
            email: email.to_string(),
            full_name: format!("Test {email}"),
            password_hash,
            role: role.to_string(),
        })
        .await
        .expect("user creation should succeed")
}

/// Sign in through the API and return the access token.
pub async fn sign_in(app: Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/signin", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK, "sign-in failed");
    let json = body_json(response).await;
    json["access_token"]
        .as_str()
        .expect("access_token present")
        .to_string()
}

/// Create a regular user and return it with a valid access token.
pub async fn user_with_token(state: &AppState, email: &str) -> (User, String) {
    let user = create_user(state, email, ROLE_USER).await;
    let token = sign_in(build_test_app(state.clone()), email).await;
    (user, token)
}

/// Create an admin and return it with a valid access token.
pub async fn admin_with_token(state: &AppState, email: &str) -> (User, String) {
    let user = create_user(state, email, ROLE_ADMIN).await;
    let token = sign_in(build_test_app(state.clone()), email).await;
    (user, token)
}

/// Poll `check` until it returns `Some`, for effects of background tasks.
pub async fn eventually<T, F, Fut>(mut check: F) -> T
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Option<T>>,
{
    for _ in 0..100 {
        if let Some(value) = check().await {
            return value;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 1s");
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("valid request");
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Collect a response body as UTF-8 text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}
