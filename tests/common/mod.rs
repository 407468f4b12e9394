//! Test utilities and fixtures for Keydesk integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub use keydesk::catalog::SoftwareCatalog;
pub use keydesk::crypto;
pub use keydesk::models::*;
pub use keydesk::registry::{KeyRegistry, Validation};
pub use keydesk::state::AppState;
pub use keydesk::store::{KeyStore, SoftwareStore, SqliteStore, UserStore};
pub use keydesk::token::TokenIssuer;

pub const TEST_ADMIN_USERNAME: &str = "admin";
pub const TEST_ADMIN_PASSWORD: &str = "password";

/// Create an in-memory store with the schema initialized.
pub fn test_store() -> SqliteStore {
    SqliteStore::in_memory().expect("Failed to create in-memory store")
}

/// Build app state on an in-memory store with a provisioned admin.
pub fn test_state() -> AppState {
    let state = AppState::new(test_store(), TokenIssuer::new(b"test-secret"));
    state
        .users
        .save(&AdminUser {
            username: TEST_ADMIN_USERNAME.to_string(),
            password_hash: crypto::hash_password(TEST_ADMIN_PASSWORD),
            updated_at: Utc::now(),
        })
        .expect("Failed to provision test admin");
    state
}

/// Build the full router for HTTP-level tests.
pub fn test_app(state: AppState) -> Router {
    keydesk::handlers::router(state.clone()).with_state(state)
}

/// Create a software entry with default values.
pub fn create_test_software(catalog: &SoftwareCatalog, name: &str) -> Software {
    catalog
        .create(CreateSoftware {
            name: name.to_string(),
            file_type: FileType::Single,
            download_urls: vec![format!("https://downloads.example.com/{}", name)],
        })
        .expect("Failed to create test software")
}

/// Fire a request at the router and decode the JSON response body.
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body was not JSON")
    };
    (status, json)
}

/// Log in as the test admin and return a bearer token.
pub async fn login(app: &Router) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/login",
        None,
        Some(json!({
            "username": TEST_ADMIN_USERNAME,
            "password": TEST_ADMIN_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().expect("missing token").to_string()
}
