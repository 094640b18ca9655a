//! Message side channel over HTTP.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_submit_then_history() {
    let app = TestApp::new().await;
    let token = app.register_and_login("alice").await;

    let response = app
        .request(
            "POST",
            "/message",
            Some(json!({ "room_id": "general", "content": "hello" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "Message stored");
    assert_eq!(response.body["room_id"], "general");
    let message_id = response.body["message_id"].as_str().unwrap().to_string();
    assert!(!message_id.is_empty());

    app.request(
        "POST",
        "/message",
        Some(json!({ "room_id": "random", "content": "elsewhere" })),
        Some(&token),
    )
    .await;

    let response = app
        .request("GET", "/messages?room_id=general", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total_count"], 1);
    assert_eq!(response.body["room_id"], "general");
    assert_eq!(response.body["messages"][0]["id"], message_id.as_str());
    assert_eq!(response.body["messages"][0]["content"], "hello");
}

#[tokio::test]
async fn test_submit_rejects_empty_message() {
    let app = TestApp::new().await;
    let token = app.register_and_login("alice").await;

    let response = app
        .request(
            "POST",
            "/message",
            Some(json!({ "room_id": "general", "content": "   " })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Empty message");

    let response = app
        .request(
            "POST",
            "/message",
            Some(json!({ "content": "no room" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reactions_and_deletion() {
    let app = TestApp::new().await;
    let alice = app.register_and_login("alice").await;
    let bob = app.register_and_login("bob").await;

    let response = app
        .request(
            "POST",
            "/message",
            Some(json!({ "room_id": "general", "content": "react to me" })),
            Some(&alice),
        )
        .await;
    let message_id = response.body["message_id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            "/message/reaction/add",
            Some(json!({ "message_id": message_id, "emoji": "🎉" })),
            Some(&bob),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "Reaction added");

    let response = app
        .request("GET", &format!("/message/{message_id}"), None, Some(&bob))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["reactions"]["🎉"].as_array().map(Vec::len), Some(1));

    let response = app
        .request(
            "POST",
            "/message/reaction/remove",
            Some(json!({ "message_id": message_id, "emoji": "🎉" })),
            Some(&bob),
        )
        .await;
    assert_eq!(response.body["status"], "Reaction removed");

    let response = app
        .request(
            "POST",
            "/message/delete",
            Some(json!({ "message_id": message_id })),
            Some(&bob),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "POST",
            "/message/delete",
            Some(json!({ "message_id": message_id })),
            Some(&alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "Message deleted");

    let response = app
        .request("GET", &format!("/message/{message_id}"), None, Some(&alice))
        .await;
    assert_eq!(response.body["deleted"], true);
}

#[tokio::test]
async fn test_unknown_message_is_not_found() {
    let app = TestApp::new().await;
    let token = app.register_and_login("alice").await;

    let response = app
        .request(
            "POST",
            "/message/reaction/add",
            Some(json!({ "message_id": "missing", "emoji": "👍" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.request("GET", "/message/missing", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
