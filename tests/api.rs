//! HTTP-level tests for the Keydesk API: auth, software CRUD, key
//! generation, and public key verification.

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::*;

#[tokio::test]
async fn test_health() {
    let app = test_app(test_state());
    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_login_wrong_password_issues_no_token() {
    let app = test_app(test_state());
    let (status, body) = request(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"username": "admin", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_login_unknown_username_rejected() {
    let app = test_app(test_state());
    let (status, _) = request(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"username": "root", "password": TEST_ADMIN_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_missing_fields_is_bad_request() {
    let app = test_app(test_state());
    let (status, _) = request(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"username": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = test_app(test_state());

    let (status, _) = request(&app, "GET", "/api/software", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, "GET", "/api/keys", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_software_crud_over_http() {
    let app = test_app(test_state());
    let token = login(&app).await;

    let (status, created) = request(
        &app,
        "POST",
        "/api/software",
        Some(&token),
        Some(json!({
            "name": "Notepad",
            "fileType": "single",
            "downloadUrls": ["https://example.com/notepad.zip"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", created);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["fileType"], "single");

    // Duplicate name is rejected
    let (status, _) = request(
        &app,
        "POST",
        "/api/software",
        Some(&token),
        Some(json!({
            "name": "Notepad",
            "fileType": "multiple",
            "downloadUrls": ["https://example.com/other.zip"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Update
    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/software/{}", id),
        Some(&token),
        Some(json!({
            "name": "Notepad Pro",
            "fileType": "multiple",
            "downloadUrls": ["https://example.com/a", "https://example.com/b"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["name"], "Notepad Pro");
    assert!(updated["updatedAt"].is_string());

    // Delete
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/software/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, listed) = request(&app, "GET", "/api/software", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 0);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/software/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_key_generation_over_http() {
    let state = test_state();
    let software = create_test_software(&state.catalog, "Keyed");
    let app = test_app(state);
    let token = login(&app).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/keys",
        Some(&token),
        Some(json!({"softwareId": software.id, "count": 3, "validityDays": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let keys = body["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 3);
    for key in keys {
        assert!(key["validUntil"].is_null());
        assert!(key["firstUsedAt"].is_null());
    }

    // Listing joins software and derives used
    let (status, listed) = request(&app, "GET", "/api/keys", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 3);
    for key in listed {
        assert_eq!(key["software"]["id"], software.id.as_str());
        assert_eq!(key["used"], false);
    }

    // Invalid counts
    let (status, _) = request(
        &app,
        "POST",
        "/api/keys",
        Some(&token),
        Some(json!({"softwareId": software.id, "count": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/api/keys",
        Some(&token),
        Some(json!({"softwareId": software.id, "count": 101})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown software
    let (status, _) = request(
        &app,
        "POST",
        "/api/keys",
        Some(&token),
        Some(json!({"softwareId": "missing", "count": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Missing fields
    let (status, _) = request(&app, "POST", "/api/keys", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_key_over_http() {
    let state = test_state();
    let software = create_test_software(&state.catalog, "Trimmed");
    let keys = state.registry.generate(&software.id, 2, None).unwrap();
    let app = test_app(state);
    let token = login(&app).await;

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/keys/{}", keys[0].id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/keys/{}", keys[0].id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_key_full_lifecycle() {
    let state = test_state();
    let software = create_test_software(&state.catalog, "Verified");
    let keys = state.registry.generate(&software.id, 3, Some(0)).unwrap();
    let code = keys[0].code.clone();
    let app = test_app(state);

    // Public endpoint, no token needed
    let (status, body) = request(
        &app,
        "POST",
        "/api/verify-key",
        None,
        Some(json!({"code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["firstUse"], true);
    assert!(body["validUntil"].is_null());
    assert_eq!(body["software"]["id"], software.id.as_str());
    let first_used_at = body["firstUsedAt"].as_str().unwrap().to_string();

    // Second check: still valid, same activation timestamp
    let (status, body) = request(
        &app,
        "POST",
        "/api/verify-key",
        None,
        Some(json!({"code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["firstUse"], false);
    assert_eq!(body["firstUsedAt"].as_str().unwrap(), first_used_at);
}

#[tokio::test]
async fn test_verify_orphaned_key_reports_null_software() {
    let store = test_store();
    let state = AppState::new(store.clone(), TokenIssuer::new(b"test-secret"));
    let software = create_test_software(&state.catalog, "Orphan");
    let keys = state.registry.generate(&software.id, 1, None).unwrap();

    // Simulate a crash between the software delete and its key sweep
    SoftwareStore::delete(&store, &software.id).unwrap();

    let app = test_app(state);
    let (status, body) = request(
        &app,
        "POST",
        "/api/verify-key",
        None,
        Some(json!({"code": keys[0].code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    // The field is present and explicitly null, matching /api/keys
    let fields = body.as_object().unwrap();
    assert!(fields.contains_key("software"));
    assert!(fields["software"].is_null());
}

#[tokio::test]
async fn test_verify_key_not_found_and_missing_code() {
    let app = test_app(test_state());

    let (status, body) = request(
        &app,
        "POST",
        "/api/verify-key",
        None,
        Some(json!({"code": "AAAA-BBBB-CCCC-DDDD"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert!(body.get("expired").is_none());

    let (status, _) = request(
        &app,
        "POST",
        "/api/verify-key",
        None,
        Some(json!({"code": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(&app, "POST", "/api/verify-key", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_password_flow() {
    let app = test_app(test_state());
    let token = login(&app).await;

    // Wrong current password
    let (status, _) = request(
        &app,
        "POST",
        "/api/change-password",
        Some(&token),
        Some(json!({"currentPassword": "nope", "newPassword": "longenough"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Too-short new password
    let (status, _) = request(
        &app,
        "POST",
        "/api/change-password",
        Some(&token),
        Some(json!({"currentPassword": TEST_ADMIN_PASSWORD, "newPassword": "tiny"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Success
    let (status, _) = request(
        &app,
        "POST",
        "/api/change-password",
        Some(&token),
        Some(json!({"currentPassword": TEST_ADMIN_PASSWORD, "newPassword": "new-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, new one does
    let (status, _) = request(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"username": TEST_ADMIN_USERNAME, "password": TEST_ADMIN_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = request(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"username": TEST_ADMIN_USERNAME, "password": "new-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}
