//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use futures::{SinkExt, StreamExt};
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use chatrelay_api::{AppState, build_app};
use chatrelay_cache::memory::MemoryPresenceStore;
use chatrelay_core::config::AppConfig;
use chatrelay_database::Stores;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching the engine directly
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application on in-memory stores
    pub async fn new() -> Self {
        let stores = Stores::in_memory();
        let state = AppState::new(
            AppConfig::default(),
            stores.messages,
            stores.users,
            Arc::new(MemoryPresenceStore::default()),
        );

        Self {
            router: build_app(state.clone()),
            state,
        }
    }

    /// Register a user and return their bearer token
    pub async fn register_and_login(&self, username: &str) -> String {
        let email = format!("{username}@test.com");
        let response = self
            .request(
                "POST",
                "/register",
                Some(serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": "password123",
                })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Register failed: {:?}",
            response.body
        );

        self.login(&email, "password123").await
    }

    /// Login and return the bearer token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/login",
                Some(serde_json::json!({ "email": email, "password": password })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        response
            .body
            .get("token")
            .and_then(|v| v.as_str())
            .expect("No token in login response")
            .to_string()
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Serve the router on an ephemeral port for socket clients
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });
        addr
    }

    /// Poll until `room` has `count` live connections
    pub async fn wait_for_members(&self, room: &str, count: usize) {
        for _ in 0..200 {
            let snapshot = self.state.engine.snapshot().await.expect("Hub stopped");
            if snapshot.members(room).len() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Room {room} never reached {count} members");
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// A connected socket client
pub struct WsClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(addr: SocketAddr, room: &str, token: &str) -> Self {
        let url = format!("ws://{addr}/ws?room={room}&token={token}");
        let (socket, _) = connect_async(url).await.expect("Handshake failed");
        Self { socket }
    }

    pub async fn send(&mut self, frame: Value) {
        self.socket
            .send(Message::text(frame.to_string()))
            .await
            .expect("Send failed");
    }

    /// Next text frame, parsed. Panics after two seconds.
    pub async fn recv(&mut self) -> Value {
        let deadline = Duration::from_secs(2);
        loop {
            let frame = tokio::time::timeout(deadline, self.socket.next())
                .await
                .expect("Timed out waiting for frame")
                .expect("Socket closed")
                .expect("Socket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).expect("Invalid JSON frame");
            }
        }
    }

    /// True if no text frame arrives within `wait`.
    pub async fn is_quiet(&mut self, wait: Duration) -> bool {
        match tokio::time::timeout(wait, self.socket.next()).await {
            Err(_) => true,
            Ok(Some(Ok(Message::Text(_)))) => false,
            Ok(_) => true,
        }
    }

    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}
