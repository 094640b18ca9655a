//! Individual connection handle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use chatrelay_core::types::{ConnectionId, UserId};

/// Why a payload could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The outbound queue is at capacity.
    Full,
    /// The connection has been closed.
    Closed,
}

/// A handle to a single connection.
///
/// The hub keeps one clone for routing and the connection's own pumps keep
/// the rest. Payloads go into a bounded queue drained by the outbound pump;
/// [`close`](Self::close) is the signal that ends both pumps.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Authenticated user
    pub user_id: UserId,
    /// Username from the token
    pub username: String,
    /// Room chosen at handshake; fixed for the life of the connection
    pub room_id: String,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<Arc<str>>,
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound queue.
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        room_id: impl Into<String>,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Arc<str>>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Arc::new(Self {
            id: ConnectionId::new(),
            user_id,
            username: username.into(),
            room_id: room_id.into(),
            connected_at: Utc::now(),
            sender,
            closed: CancellationToken::new(),
        });
        (handle, receiver)
    }

    /// Queue a payload without waiting.
    pub fn try_send(&self, payload: Arc<str>) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }
        self.sender.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Close the connection. Idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once the connection is closed.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }
}
