//! Top-level real-time engine that ties the hub, the pumps, and the
//! presence relay together.

use std::fmt::Display;
use std::sync::Arc;

use futures::{Sink, Stream};
use tracing::info;

use chatrelay_core::config::RealtimeConfig;
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::{MessageStore, PresenceStore};

use crate::connection::{ConnectionEndpoint, ConnectionHandle, Handshake, TransportFrame};
use crate::hub::{Hub, HubSnapshot};
use crate::metrics::EngineMetrics;
use crate::presence::PresenceRelay;

/// Central real-time engine shared by the socket handler and the HTTP side
/// channel.
#[derive(Clone)]
pub struct RealtimeEngine {
    hub: Hub,
    store: Arc<dyn MessageStore>,
    metrics: Arc<EngineMetrics>,
    config: RealtimeConfig,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("config", &self.config)
            .finish()
    }
}

impl RealtimeEngine {
    /// Start the hub and presence relay tasks. Must be called inside a
    /// tokio runtime.
    pub fn new(
        config: RealtimeConfig,
        store: Arc<dyn MessageStore>,
        presence: Arc<dyn PresenceStore>,
    ) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let (relay, _) =
            PresenceRelay::spawn(presence, config.presence_queue_capacity, metrics.clone());
        let (hub, _) = Hub::spawn(config.hub_queue_capacity, relay, metrics.clone());

        info!(
            outbound_queue = config.outbound_queue_capacity,
            hub_queue = config.hub_queue_capacity,
            "Real-time engine initialized"
        );

        Self {
            hub,
            store,
            metrics,
            config,
        }
    }

    /// The hub, for side-channel publishes.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Current registry contents.
    pub async fn snapshot(&self) -> AppResult<HubSnapshot> {
        self.hub.snapshot().await
    }

    /// Register an authenticated connection and pump it until it closes.
    ///
    /// Fails only if the hub is no longer running; transport errors end the
    /// connection and are not reported here.
    pub async fn connect<S, R, E>(&self, handshake: Handshake, sink: S, stream: R) -> AppResult<()>
    where
        S: Sink<Arc<str>> + Send + 'static,
        S::Error: Display + Send,
        R: Stream<Item = Result<TransportFrame, E>>,
        E: Display,
    {
        let (handle, rx) = ConnectionHandle::new(
            handshake.user_id,
            handshake.username,
            handshake.room_id,
            self.config.outbound_queue_capacity,
        );
        self.hub.join(handle.clone()).await?;
        self.metrics.connection_opened();

        ConnectionEndpoint::new(
            handle,
            self.hub.clone(),
            self.store.clone(),
            self.metrics.clone(),
            self.config.max_frame_bytes,
        )
        .run(rx, sink, stream)
        .await;

        self.metrics.connection_closed();
        Ok(())
    }

    /// Close every connection and stop the hub.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.hub.shutdown().await;
        info!("Real-time engine shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::StreamExt;
    use futures::channel::mpsc;
    use serde_json::{Value, json};
    use tokio::task::JoinHandle;

    use chatrelay_cache::memory::MemoryPresenceStore;
    use chatrelay_core::error::AppError;
    use chatrelay_core::types::{ChatMessage, NewMessage, UserId};
    use chatrelay_database::MemoryMessageStore;

    use super::*;

    /// Message store that counts inserts and can be told to fail them.
    #[derive(Debug, Default)]
    struct CountingStore {
        inner: MemoryMessageStore,
        inserts: AtomicUsize,
        fail: bool,
    }

    impl CountingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn inserts(&self) -> usize {
            self.inserts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageStore for CountingStore {
        async fn insert(&self, message: NewMessage) -> AppResult<ChatMessage> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::database("connection refused"));
            }
            self.inner.insert(message).await
        }
        async fn mark_deleted(&self, id: &str) -> AppResult<()> {
            self.inner.mark_deleted(id).await
        }
        async fn add_reaction(&self, id: &str, emoji: &str, user_id: UserId) -> AppResult<()> {
            self.inner.add_reaction(id, emoji, user_id).await
        }
        async fn remove_reaction(&self, id: &str, emoji: &str, user_id: UserId) -> AppResult<()> {
            self.inner.remove_reaction(id, emoji, user_id).await
        }
        async fn fetch_by_room(&self, room_id: &str) -> AppResult<Vec<ChatMessage>> {
            self.inner.fetch_by_room(room_id).await
        }
        async fn fetch_by_id(&self, id: &str) -> AppResult<Option<ChatMessage>> {
            self.inner.fetch_by_id(id).await
        }
        async fn health_check(&self) -> AppResult<bool> {
            Ok(true)
        }
    }

    struct Harness {
        engine: RealtimeEngine,
        store: Arc<CountingStore>,
        presence: Arc<MemoryPresenceStore>,
    }

    fn harness_with(store: CountingStore, config: RealtimeConfig) -> Harness {
        let store = Arc::new(store);
        let presence = Arc::new(MemoryPresenceStore::default());
        let engine = RealtimeEngine::new(config, store.clone(), presence.clone());
        Harness {
            engine,
            store,
            presence,
        }
    }

    fn harness() -> Harness {
        harness_with(CountingStore::default(), RealtimeConfig::default())
    }

    /// A connected test client: frames in through `input`, frames out of
    /// `output`.
    struct Client {
        input: mpsc::UnboundedSender<Result<TransportFrame, Infallible>>,
        output: mpsc::UnboundedReceiver<Arc<str>>,
        task: JoinHandle<AppResult<()>>,
    }

    impl Client {
        fn send(&self, frame: Value) {
            self.input
                .unbounded_send(Ok(TransportFrame::Text(frame.to_string())))
                .unwrap();
        }

        fn send_raw(&self, text: &str) {
            self.input
                .unbounded_send(Ok(TransportFrame::Text(text.to_string())))
                .unwrap();
        }

        async fn recv(&mut self) -> Value {
            let payload = tokio::time::timeout(Duration::from_secs(2), self.output.next())
                .await
                .expect("timed out waiting for frame")
                .expect("connection output closed");
            serde_json::from_str(&payload).unwrap()
        }

        async fn finish(self) {
            drop(self.input);
            tokio::time::timeout(Duration::from_secs(2), self.task)
                .await
                .expect("connection did not stop")
                .unwrap()
                .unwrap();
        }
    }

    async fn wait_for<F>(engine: &RealtimeEngine, mut done: F)
    where
        F: FnMut(&HubSnapshot) -> bool,
    {
        for _ in 0..200 {
            if done(&engine.snapshot().await.unwrap()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("hub never reached the expected state");
    }

    async fn connect(engine: &RealtimeEngine, user_id: UserId, room: &str) -> Client {
        let (input, stream) = mpsc::unbounded();
        let (sink, output) = mpsc::unbounded::<Arc<str>>();
        let before = engine.snapshot().await.unwrap().members(room).len();

        let handshake = Handshake {
            user_id,
            username: format!("user{user_id}"),
            room_id: room.to_string(),
        };
        let task = tokio::spawn({
            let engine = engine.clone();
            async move { engine.connect(handshake, sink, stream).await }
        });

        let room = room.to_string();
        wait_for(engine, |snap| snap.members(&room).len() > before).await;
        Client {
            input,
            output,
            task,
        }
    }

    #[tokio::test]
    async fn test_message_is_persisted_then_broadcast_to_room() {
        let h = harness();
        let mut sender = connect(&h.engine, 42, "general").await;
        let mut peer = connect(&h.engine, 7, "general").await;

        sender.send(json!({
            "type": "message",
            "room_id": "general",
            "sender_id": 42,
            "content": "hi"
        }));

        for client in [&mut sender, &mut peer] {
            let frame = client.recv().await;
            assert_eq!(frame["type"], "message");
            assert_eq!(frame["content"], "hi");
            assert_eq!(frame["sender_id"], 42);
            assert!(!frame["message_id"].as_str().unwrap().is_empty());
            assert!(frame["timestamp"].as_i64().unwrap() > 0);
        }

        assert_eq!(h.store.inserts(), 1);
        let stored = h.store.fetch_by_room("general").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, "hi");
        assert_eq!(stored[0].sender_id, 42);
    }

    #[tokio::test]
    async fn test_sender_id_comes_from_the_handshake() {
        let h = harness();
        let mut client = connect(&h.engine, 42, "general").await;

        client.send(json!({"type": "message", "sender_id": 999, "content": "spoofed"}));

        let frame = client.recv().await;
        assert_eq!(frame["sender_id"], 42);
        assert_eq!(frame["room_id"], "general");
    }

    #[tokio::test]
    async fn test_replayed_broadcast_is_not_persisted_again() {
        let h = harness();
        let mut a = connect(&h.engine, 1, "general").await;
        let mut b = connect(&h.engine, 2, "general").await;

        a.send(json!({"type": "message", "room_id": "general", "content": "once"}));
        let broadcast = a.recv().await;
        b.recv().await;

        b.send(broadcast.clone());
        assert_eq!(a.recv().await["message_id"], broadcast["message_id"]);
        assert_eq!(b.recv().await["message_id"], broadcast["message_id"]);

        assert_eq!(h.store.inserts(), 1);
    }

    #[tokio::test]
    async fn test_message_with_existing_id_is_relayed_without_insert() {
        let h = harness();
        let mut a = connect(&h.engine, 1, "general").await;
        let mut b = connect(&h.engine, 2, "general").await;

        a.send(json!({
            "type": "message",
            "message_id": "abc123",
            "room_id": "general",
            "sender_id": 1,
            "content": "from http"
        }));

        assert_eq!(a.recv().await["message_id"], "abc123");
        assert_eq!(b.recv().await["message_id"], "abc123");
        assert_eq!(h.store.inserts(), 0);
    }

    #[tokio::test]
    async fn test_ping_gets_pong_for_sender_only() {
        let h = harness();
        let mut a = connect(&h.engine, 1, "general").await;
        let mut b = connect(&h.engine, 2, "general").await;

        a.send(json!({"type": "ping"}));
        assert_eq!(a.recv().await, json!({"type": "pong"}));

        a.send(json!({"type": "typing", "room_id": "general", "sender_id": 1}));
        assert_eq!(b.recv().await["type"], "typing");
        assert_eq!(h.engine.metrics().snapshot().envelopes_published, 1);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let h = harness();
        let mut a = connect(&h.engine, 1, "general").await;
        let mut b = connect(&h.engine, 2, "general").await;

        a.send(json!({"type": "message", "room_id": "general", "content": "   "}));
        assert_eq!(a.recv().await, json!({"type": "error", "error": "Empty message"}));

        a.send(json!({"type": "typing", "room_id": "general"}));
        assert_eq!(b.recv().await["type"], "typing");
        assert_eq!(h.store.inserts(), 0);
    }

    #[tokio::test]
    async fn test_other_room_is_rejected() {
        let h = harness();
        let mut a = connect(&h.engine, 1, "general").await;
        let mut c = connect(&h.engine, 3, "random").await;

        a.send(json!({"type": "message", "room_id": "random", "content": "sneaky"}));
        assert_eq!(a.recv().await, json!({"type": "error", "error": "Room mismatch"}));

        a.send(json!({"type": "typing", "room_id": "random"}));
        assert_eq!(a.recv().await, json!({"type": "error", "error": "Room mismatch"}));

        c.send(json!({"type": "typing", "room_id": "random"}));
        assert_eq!(c.recv().await["type"], "typing");
        assert_eq!(h.store.inserts(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_without_room_uses_connection_room() {
        let h = harness();
        let mut a = connect(&h.engine, 1, "general").await;

        a.send(json!({"type": "typing", "sender_id": 1, "custom": "kept"}));

        let frame = a.recv().await;
        assert_eq!(frame["room_id"], "general");
        assert_eq!(frame["custom"], "kept");
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let h = harness();
        let mut a = connect(&h.engine, 1, "general").await;
        let mut c = connect(&h.engine, 3, "random").await;

        a.send(json!({"type": "message", "room_id": "general", "content": "general only"}));
        a.recv().await;

        c.send(json!({"type": "message", "room_id": "random", "content": "random only"}));
        assert_eq!(c.recv().await["content"], "random only");
    }

    #[tokio::test]
    async fn test_frames_from_one_connection_arrive_in_order() {
        let h = harness();
        let a = connect(&h.engine, 1, "general").await;
        let mut b = connect(&h.engine, 2, "general").await;

        for i in 0..50 {
            if i % 5 == 0 {
                a.send(json!({"type": "message", "room_id": "general", "content": i.to_string()}));
            } else {
                a.send(json!({"type": "typing", "room_id": "general", "content": i.to_string()}));
            }
        }

        for i in 0..50 {
            assert_eq!(b.recv().await["content"], i.to_string());
        }
        assert_eq!(h.store.inserts(), 10);
    }

    #[tokio::test]
    async fn test_malformed_frames_are_dropped() {
        let h = harness();
        let mut a = connect(&h.engine, 1, "general").await;

        a.send_raw("not json");
        a.send_raw(r#"{"room_id": "general"}"#);
        a.send(json!({"type": "ping"}));

        assert_eq!(a.recv().await["type"], "pong");
        let metrics = h.engine.metrics().snapshot();
        assert_eq!(metrics.frames_received, 3);
        assert_eq!(metrics.frames_dropped, 2);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_dropped() {
        let config = RealtimeConfig {
            max_frame_bytes: 64,
            ..RealtimeConfig::default()
        };
        let h = harness_with(CountingStore::default(), config);
        let mut a = connect(&h.engine, 1, "general").await;

        a.send(json!({"type": "message", "content": "x".repeat(100)}));
        a.send(json!({"type": "ping"}));

        assert_eq!(a.recv().await["type"], "pong");
        assert_eq!(h.store.inserts(), 0);
        assert_eq!(h.engine.metrics().snapshot().frames_dropped, 1);
    }

    #[tokio::test]
    async fn test_store_failure_reports_error_and_skips_broadcast() {
        let h = harness_with(CountingStore::failing(), RealtimeConfig::default());
        let mut a = connect(&h.engine, 1, "general").await;
        let mut b = connect(&h.engine, 2, "general").await;

        a.send(json!({"type": "message", "room_id": "general", "content": "lost"}));
        assert_eq!(
            a.recv().await,
            json!({"type": "error", "error": "Failed to store message"})
        );

        a.send(json!({"type": "typing", "room_id": "general"}));
        assert_eq!(b.recv().await["type"], "typing");
        assert_eq!(h.engine.metrics().snapshot().persistence_failures, 1);
    }

    #[tokio::test]
    async fn test_disconnect_leaves_hub_and_goes_offline() {
        let h = harness();
        let a = connect(&h.engine, 42, "general").await;
        let b = connect(&h.engine, 7, "general").await;

        a.finish().await;
        let snap = h.engine.snapshot().await.unwrap();
        assert_eq!(snap.connections, 1);
        assert_eq!(snap.members("general").len(), 1);

        b.finish().await;
        let snap = h.engine.snapshot().await.unwrap();
        assert_eq!(snap, HubSnapshot::default());

        for _ in 0..200 {
            if h.presence.last_seen(7).await.unwrap().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!h.presence.is_online(42).await.unwrap());
        assert!(!h.presence.is_online(7).await.unwrap());
        assert!(h.presence.last_seen(42).await.unwrap().is_some());

        let metrics = h.engine.metrics().snapshot();
        assert_eq!(metrics.connections_opened, 2);
        assert_eq!(metrics.connections_closed, 2);
        assert_eq!(metrics.connections_active, 0);
    }

    #[tokio::test]
    async fn test_transport_close_frame_ends_connection() {
        let h = harness();
        let a = connect(&h.engine, 1, "general").await;

        a.input.unbounded_send(Ok(TransportFrame::Close)).unwrap();
        tokio::time::timeout(Duration::from_secs(2), a.task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(h.engine.snapshot().await.unwrap().connections, 0);
    }

    #[tokio::test]
    async fn test_slow_consumer_is_evicted_while_room_keeps_receiving() {
        let config = RealtimeConfig {
            outbound_queue_capacity: 4,
            ..RealtimeConfig::default()
        };
        let h = harness_with(CountingStore::default(), config);
        let mut publisher = connect(&h.engine, 1, "general").await;
        let mut fast = connect(&h.engine, 2, "general").await;

        // A transport that accepts one frame and then never drains.
        let (slow_input, slow_stream) =
            mpsc::unbounded::<Result<TransportFrame, Infallible>>();
        let (slow_sink, _slow_output) = mpsc::channel::<Arc<str>>(0);
        let slow = tokio::spawn({
            let engine = h.engine.clone();
            let handshake = Handshake {
                user_id: 3,
                username: "slow".into(),
                room_id: "general".into(),
            };
            async move { engine.connect(handshake, slow_sink, slow_stream).await }
        });
        wait_for(&h.engine, |snap| snap.members("general").len() == 3).await;

        for i in 0..10 {
            publisher.send(json!({"type": "typing", "room_id": "general", "content": i.to_string()}));
            assert_eq!(publisher.recv().await["content"], i.to_string());
            assert_eq!(fast.recv().await["content"], i.to_string());
        }

        tokio::time::timeout(Duration::from_secs(2), slow)
            .await
            .expect("slow connection was not closed")
            .unwrap()
            .unwrap();
        let snap = h.engine.snapshot().await.unwrap();
        assert_eq!(snap.members("general").len(), 2);
        assert_eq!(h.engine.metrics().snapshot().evictions, 1);
        drop(slow_input);
    }

    #[tokio::test]
    async fn test_shutdown_closes_all_connections() {
        let h = harness();
        let a = connect(&h.engine, 1, "general").await;
        let b = connect(&h.engine, 2, "random").await;

        h.engine.shutdown().await;

        for task in [a.task, b.task] {
            tokio::time::timeout(Duration::from_secs(2), task)
                .await
                .unwrap()
                .unwrap()
                .unwrap();
        }
        assert!(h.engine.snapshot().await.is_err());
    }
}
