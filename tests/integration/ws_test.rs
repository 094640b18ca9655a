//! Socket handshake and live relay through a real listener.

use std::time::Duration;

use futures::StreamExt;
use http::StatusCode;
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::helpers::{TestApp, WsClient};

#[tokio::test]
async fn test_upgrade_requires_room_and_token() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/ws", None, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app.request("GET", "/ws?room=general", None, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request("GET", "/ws?room=general&token=not-a-jwt", None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_token_refuses_handshake() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;

    let err = connect_async(format!("ws://{addr}/ws?room=general&token=bogus"))
        .await
        .unwrap_err();
    match err {
        WsError::Http(response) => assert_eq!(response.status(), StatusCode::UNAUTHORIZED),
        other => panic!("Expected HTTP rejection, got {other}"),
    }
}

#[tokio::test]
async fn test_room_relay() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let alice_token = app.register_and_login("alice").await;
    let bob_token = app.register_and_login("bob").await;
    let carol_token = app.register_and_login("carol").await;

    let mut alice = WsClient::connect(addr, "general", &alice_token).await;
    let mut bob = WsClient::connect(addr, "general", &bob_token).await;
    let mut carol = WsClient::connect(addr, "random", &carol_token).await;
    app.wait_for_members("general", 2).await;
    app.wait_for_members("random", 1).await;

    alice
        .send(json!({ "type": "message", "room_id": "general", "content": "hi all" }))
        .await;

    let at_bob = bob.recv().await;
    assert_eq!(at_bob["type"], "message");
    assert_eq!(at_bob["content"], "hi all");
    assert!(!at_bob["message_id"].as_str().unwrap().is_empty());
    assert_eq!(alice.recv().await, at_bob);
    assert!(carol.is_quiet(Duration::from_millis(200)).await);

    let response = app
        .request("GET", "/messages?room_id=general", None, Some(&bob_token))
        .await;
    assert_eq!(response.body["total_count"], 1);
    assert_eq!(response.body["messages"][0]["id"], at_bob["message_id"]);

    alice.close().await;
    bob.close().await;
    carol.close().await;
}

#[tokio::test]
async fn test_ping_and_rejections_reply_to_sender_only() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let alice_token = app.register_and_login("alice").await;
    let bob_token = app.register_and_login("bob").await;

    let mut alice = WsClient::connect(addr, "general", &alice_token).await;
    let mut bob = WsClient::connect(addr, "general", &bob_token).await;
    app.wait_for_members("general", 2).await;

    alice.send(json!({ "type": "ping" })).await;
    assert_eq!(alice.recv().await, json!({ "type": "pong" }));

    alice
        .send(json!({ "type": "message", "room_id": "general", "content": "" }))
        .await;
    assert_eq!(alice.recv().await, json!({ "type": "error", "error": "Empty message" }));

    alice
        .send(json!({ "type": "message", "room_id": "random", "content": "sneaky" }))
        .await;
    assert_eq!(alice.recv().await, json!({ "type": "error", "error": "Room mismatch" }));

    assert!(bob.is_quiet(Duration::from_millis(200)).await);
}

#[tokio::test]
async fn test_http_submission_reaches_socket() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let token = app.register_and_login("alice").await;

    let mut listener = WsClient::connect(addr, "general", &token).await;
    app.wait_for_members("general", 1).await;

    let response = app
        .request(
            "POST",
            "/message",
            Some(json!({ "room_id": "general", "content": "from http" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let frame = listener.recv().await;
    assert_eq!(frame["message_id"], response.body["message_id"]);
    assert_eq!(frame["content"], "from http");

    let response = app
        .request(
            "POST",
            "/message/delete",
            Some(json!({ "message_id": frame["message_id"] })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let frame = listener.recv().await;
    assert_eq!(frame["type"], "deletion");
    assert_eq!(frame["room_id"], "general");
}

#[tokio::test]
async fn test_presence_follows_connection() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let token = app.register_and_login("alice").await;

    let client = WsClient::connect(addr, "general", &token).await;
    app.wait_for_members("general", 1).await;

    let mut online = Vec::new();
    for _ in 0..200 {
        let response = app.request("GET", "/online-users?room=general", None, None).await;
        online = response.body["users"].as_array().cloned().unwrap_or_default();
        if !online.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(online.len(), 1);
    let user_id = online[0].as_i64().unwrap();

    let response = app
        .request("GET", "/health", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["connections"], 1);

    client.close().await;
    app.wait_for_members("general", 0).await;

    let mut status = serde_json::Value::Null;
    for _ in 0..200 {
        let response = app
            .request("GET", &format!("/user-status?user={user_id}"), None, None)
            .await;
        status = response.body;
        if status["online"] == false {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status["online"], false);
    assert!(status["last_seen"].is_i64());
}

#[tokio::test]
async fn test_server_stream_ends_on_engine_shutdown() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let token = app.register_and_login("alice").await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?room=general&token={token}"))
        .await
        .unwrap();
    app.wait_for_members("general", 1).await;

    app.state.engine.shutdown().await;

    let ended = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(Ok(_)) = socket.next().await {}
    })
    .await;
    assert!(ended.is_ok());
}
