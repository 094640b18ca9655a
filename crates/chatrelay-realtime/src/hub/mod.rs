//! The connection hub.
//!
//! A single task owns the connection registry; everything else talks to it
//! through [`Hub`], a cheap cloneable handle over a bounded command queue.
//! Fan-out never blocks on a recipient: a connection whose outbound queue
//! is full is evicted instead.

mod actor;
pub mod command;
mod registry;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use chatrelay_core::error::AppError;
use chatrelay_core::result::AppResult;
use chatrelay_core::types::ConnectionId;

pub use command::{HubCommand, HubSnapshot};

use crate::connection::ConnectionHandle;
use crate::metrics::EngineMetrics;
use crate::presence::PresenceRelay;

use self::actor::HubActor;

/// Handle to the hub task.
#[derive(Debug, Clone)]
pub struct Hub {
    tx: mpsc::Sender<HubCommand>,
}

impl Hub {
    /// Spawn the hub task.
    pub fn spawn(
        capacity: usize,
        presence: PresenceRelay,
        metrics: Arc<EngineMetrics>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(HubActor::new(presence, metrics).run(rx));
        (Self { tx }, task)
    }

    /// Register a connection. Returns once the hub has applied the join, so
    /// publishes sent afterwards reach it.
    pub async fn join(&self, handle: Arc<ConnectionHandle>) -> AppResult<()> {
        let (ack, done) = oneshot::channel();
        self.send(HubCommand::Join { handle, ack }).await?;
        done.await.map_err(|_| stopped())
    }

    /// Remove a connection. Idempotent, and a no-op once the hub has stopped.
    pub async fn leave(&self, conn_id: ConnectionId) {
        if self.tx.send(HubCommand::Leave { conn_id }).await.is_err() {
            debug!(%conn_id, "Hub stopped before leave");
        }
    }

    /// Fan a payload out to every connection in `room_id`.
    pub async fn publish(&self, room_id: impl Into<String>, payload: Arc<str>) -> AppResult<()> {
        self.send(HubCommand::Publish {
            room_id: room_id.into(),
            payload,
        })
        .await
    }

    /// Current registry contents.
    pub async fn snapshot(&self) -> AppResult<HubSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| stopped())
    }

    /// Close every connection and stop the hub. Safe to call more than once.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(HubCommand::Shutdown { ack }).await.is_ok() {
            let _ = done.await;
        }
    }

    async fn send(&self, command: HubCommand) -> AppResult<()> {
        self.tx.send(command).await.map_err(|_| stopped())
    }
}

fn stopped() -> AppError {
    AppError::service_unavailable("Connection hub is not running")
}
