//! Registration, login, and bearer authentication.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/register",
            Some(serde_json::json!({
                "username": "alice",
                "email": "alice@test.com",
                "password": "password123",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["username"], "alice");
    assert!(response.body.get("password_hash").is_none());

    let token = app.login("alice@test.com", "password123").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register_and_login("bob").await;

    let response = app
        .request(
            "POST",
            "/register",
            Some(serde_json::json!({
                "username": "bob",
                "email": "bob@test.com",
                "password": "other",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_register_requires_fields() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/register",
            Some(serde_json::json!({ "username": "", "email": "x@test.com", "password": "pw" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new().await;
    app.register_and_login("carol").await;

    let response = app
        .request(
            "POST",
            "/login",
            Some(serde_json::json!({ "email": "carol@test.com", "password": "nope" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_requires_bearer() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/messages?room_id=general", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/messages?room_id=general", None, Some("garbage"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ping() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/ping", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "pong");
}
