//! The per-connection pumps.
//!
//! Each connection runs two loops. The inbound loop reads one frame at a
//! time, classifies it, and finishes any persistence and publish before it
//! reads the next frame, which keeps one connection's messages in arrival
//! order. The outbound loop drains the connection's bounded queue into the
//! transport until the handle is closed.

use std::fmt::Display;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use chatrelay_core::traits::MessageStore;
use chatrelay_core::types::ConnectionId;

use super::handle::{ConnectionHandle, SendError};
use super::transport::TransportFrame;
use crate::hub::Hub;
use crate::message::{Disposition, Envelope, OutboundFrame, classify, decode_envelope, encode_frame};
use crate::metrics::EngineMetrics;

/// Error text for an envelope addressed to another room.
pub const ROOM_MISMATCH: &str = "Room mismatch";
/// Error text when the message store rejects an insert.
pub const STORE_FAILED: &str = "Failed to store message";

/// Upper bound on flushing the transport after the outbound loop stops.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives one registered connection until either side ends it.
#[derive(Debug)]
pub struct ConnectionEndpoint {
    handle: Arc<ConnectionHandle>,
    hub: Hub,
    store: Arc<dyn MessageStore>,
    metrics: Arc<EngineMetrics>,
    max_frame_bytes: usize,
}

/// How an envelope's room relates to the connection's room.
enum RoomCheck {
    /// Named the connection's room; the raw frame can be relayed.
    Matches,
    /// Had no room; it was filled in and must be re-encoded.
    Filled,
    Mismatch,
}

impl ConnectionEndpoint {
    pub fn new(
        handle: Arc<ConnectionHandle>,
        hub: Hub,
        store: Arc<dyn MessageStore>,
        metrics: Arc<EngineMetrics>,
        max_frame_bytes: usize,
    ) -> Self {
        Self {
            handle,
            hub,
            store,
            metrics,
            max_frame_bytes,
        }
    }

    /// Run both pumps to completion.
    ///
    /// `rx` is the queue half returned with the handle. The outbound loop
    /// runs on its own task; the inbound loop runs on the caller's. Returns
    /// after the connection has left the hub and the outbound loop has
    /// stopped.
    pub async fn run<S, R, E>(self, rx: mpsc::Receiver<Arc<str>>, sink: S, stream: R)
    where
        S: Sink<Arc<str>> + Send + 'static,
        S::Error: Display + Send,
        R: Stream<Item = Result<TransportFrame, E>>,
        E: Display,
    {
        let outbound = tokio::spawn(outbound_loop(self.handle.clone(), rx, sink));
        let mut guard = LeaveGuard::new(self.hub.clone(), self.handle.id);

        self.inbound_loop(stream).await;

        self.handle.close();
        guard.leave().await;
        if let Err(e) = outbound.await {
            warn!(conn_id = %self.handle.id, error = %e, "Outbound pump panicked");
        }
        debug!(conn_id = %self.handle.id, "Connection pumps stopped");
    }

    async fn inbound_loop<R, E>(&self, stream: R)
    where
        R: Stream<Item = Result<TransportFrame, E>>,
        E: Display,
    {
        let mut stream = pin!(stream);
        loop {
            let frame = tokio::select! {
                biased;
                _ = self.handle.closed() => break,
                frame = stream.next() => frame,
            };

            match frame {
                Some(Ok(TransportFrame::Text(text))) => self.on_text(text).await,
                Some(Ok(TransportFrame::Close)) | None => break,
                Some(Err(e)) => {
                    debug!(conn_id = %self.handle.id, error = %e, "Transport read failed");
                    break;
                }
            }
        }
    }

    async fn on_text(&self, text: String) {
        self.metrics.frame_received();

        let mut envelope = match decode_envelope(&text, self.max_frame_bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.metrics.frame_dropped();
                debug!(conn_id = %self.handle.id, error = %e, "Dropping inbound frame");
                return;
            }
        };

        match classify(&envelope) {
            Disposition::ReplyOnly => self.reply(&OutboundFrame::Pong),
            Disposition::Reject(reason) => self.reply(&OutboundFrame::error(reason)),
            Disposition::Discard => {
                debug!(conn_id = %self.handle.id, kind = ?envelope.kind, "Ignoring inbound frame");
            }
            Disposition::BroadcastOnly => match self.check_room(&mut envelope) {
                RoomCheck::Matches => self.publish(Arc::from(text)).await,
                RoomCheck::Filled => self.publish_envelope(&envelope).await,
                RoomCheck::Mismatch => self.reply(&OutboundFrame::error(ROOM_MISMATCH)),
            },
            Disposition::PersistThenBroadcast => {
                if let RoomCheck::Mismatch = self.check_room(&mut envelope) {
                    self.reply(&OutboundFrame::error(ROOM_MISMATCH));
                    return;
                }
                self.persist_then_publish(envelope).await;
            }
        }
    }

    fn check_room(&self, envelope: &mut Envelope) -> RoomCheck {
        if envelope.room_id.is_empty() {
            envelope.room_id = self.handle.room_id.clone();
            RoomCheck::Filled
        } else if envelope.room_id == self.handle.room_id {
            RoomCheck::Matches
        } else {
            RoomCheck::Mismatch
        }
    }

    async fn persist_then_publish(&self, mut envelope: Envelope) {
        let stored = match self
            .store
            .insert(envelope.to_new_message(self.handle.user_id))
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                self.metrics.persistence_failure();
                warn!(
                    conn_id = %self.handle.id,
                    room_id = %self.handle.room_id,
                    error = %e,
                    "Failed to persist message"
                );
                self.reply(&OutboundFrame::error(STORE_FAILED));
                return;
            }
        };

        envelope.apply_stored(&stored);
        self.publish_envelope(&envelope).await;
    }

    async fn publish_envelope(&self, envelope: &Envelope) {
        match encode_frame(envelope) {
            Ok(payload) => self.publish(payload).await,
            Err(e) => warn!(conn_id = %self.handle.id, error = %e, "Failed to encode envelope"),
        }
    }

    async fn publish(&self, payload: Arc<str>) {
        if let Err(e) = self.hub.publish(self.handle.room_id.as_str(), payload).await {
            debug!(conn_id = %self.handle.id, error = %e, "Publish after hub stopped");
        }
    }

    /// Queue a frame for this connection only.
    fn reply(&self, frame: &OutboundFrame) {
        let payload = match encode_frame(frame) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(conn_id = %self.handle.id, error = %e, "Failed to encode reply");
                return;
            }
        };

        match self.handle.try_send(payload) {
            Ok(()) => {}
            Err(SendError::Full) => {
                self.metrics.reply_dropped();
                warn!(conn_id = %self.handle.id, "Outbound queue full, dropping reply");
            }
            Err(SendError::Closed) => {
                debug!(conn_id = %self.handle.id, "Reply to closed connection dropped");
            }
        }
    }
}

async fn outbound_loop<S>(handle: Arc<ConnectionHandle>, mut rx: mpsc::Receiver<Arc<str>>, sink: S)
where
    S: Sink<Arc<str>>,
    S::Error: Display + Send,
{
    let mut sink = pin!(sink);
    loop {
        let payload = tokio::select! {
            biased;
            _ = handle.closed() => break,
            payload = rx.recv() => match payload {
                Some(payload) => payload,
                None => break,
            },
        };

        let sent = tokio::select! {
            biased;
            _ = handle.closed() => break,
            sent = sink.send(payload) => sent,
        };
        if let Err(e) = sent {
            debug!(conn_id = %handle.id, error = %e, "Transport write failed");
            break;
        }
    }

    handle.close();
    match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(conn_id = %handle.id, error = %e, "Transport close failed"),
        Err(_) => debug!(conn_id = %handle.id, "Transport close timed out"),
    }
}

/// Sends the hub a Leave exactly once.
///
/// The normal path awaits [`leave`](Self::leave). If the pump future is
/// dropped first, the guard hands the Leave to a spawned task instead.
struct LeaveGuard {
    hub: Hub,
    conn_id: ConnectionId,
    armed: bool,
}

impl LeaveGuard {
    fn new(hub: Hub, conn_id: ConnectionId) -> Self {
        Self {
            hub,
            conn_id,
            armed: true,
        }
    }

    async fn leave(&mut self) {
        if std::mem::take(&mut self.armed) {
            self.hub.leave(self.conn_id).await;
        }
    }
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let hub = self.hub.clone();
        let conn_id = self.conn_id;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { hub.leave(conn_id).await });
            }
            Err(_) => warn!(%conn_id, "No runtime to deliver leave"),
        }
    }
}
