//! The hub's owner task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chatrelay_core::types::ConnectionId;

use super::command::HubCommand;
use super::registry::Registry;
use crate::connection::{ConnectionHandle, SendError};
use crate::metrics::EngineMetrics;
use crate::presence::PresenceRelay;

/// Why a connection left the registry.
#[derive(Debug, Clone, Copy)]
enum Removal {
    Left,
    Evicted,
    Gone,
    Shutdown,
}

/// Sole owner of the registry. Applies commands in arrival order and never
/// awaits anything but the next command.
pub(crate) struct HubActor {
    registry: Registry,
    presence: PresenceRelay,
    metrics: Arc<EngineMetrics>,
}

impl HubActor {
    pub(crate) fn new(presence: PresenceRelay, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            registry: Registry::default(),
            presence,
            metrics,
        }
    }

    pub(crate) async fn run(mut self, mut rx: mpsc::Receiver<HubCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                HubCommand::Join { handle, ack } => {
                    self.join(handle);
                    let _ = ack.send(());
                }
                HubCommand::Leave { conn_id } => {
                    self.remove(&conn_id, Removal::Left);
                }
                HubCommand::Publish { room_id, payload } => {
                    self.publish(&room_id, payload);
                }
                HubCommand::Snapshot { reply } => {
                    let _ = reply.send(self.registry.snapshot());
                }
                HubCommand::Shutdown { ack } => {
                    self.shutdown();
                    let _ = ack.send(());
                    break;
                }
            }
        }
        debug!("Hub stopped");
    }

    fn join(&mut self, handle: Arc<ConnectionHandle>) {
        if !self.registry.insert(handle.clone()) {
            warn!(conn_id = %handle.id, "Connection already registered");
            return;
        }
        self.presence.online(handle.user_id, &handle.room_id);
        info!(
            conn_id = %handle.id,
            user_id = handle.user_id,
            room_id = %handle.room_id,
            total = self.registry.len(),
            "Connection joined"
        );
    }

    fn remove(&mut self, conn_id: &ConnectionId, reason: Removal) {
        let Some(handle) = self.registry.remove(conn_id) else {
            debug!(%conn_id, "Leave for unknown connection ignored");
            return;
        };
        handle.close();
        self.presence.offline(handle.user_id, &handle.room_id);
        info!(
            conn_id = %handle.id,
            user_id = handle.user_id,
            room_id = %handle.room_id,
            ?reason,
            total = self.registry.len(),
            "Connection removed"
        );
    }

    fn publish(&mut self, room_id: &str, payload: Arc<str>) {
        self.metrics.envelope_published();

        let mut delivered = 0;
        let mut evicted = Vec::new();
        let mut gone = Vec::new();
        for member in self.registry.members(room_id) {
            match member.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(SendError::Full) => evicted.push(member.id),
                Err(SendError::Closed) => gone.push(member.id),
            }
        }
        self.metrics.delivered(delivered);

        for conn_id in evicted {
            self.metrics.eviction();
            warn!(%conn_id, room_id, "Outbound queue full, evicting slow consumer");
            self.remove(&conn_id, Removal::Evicted);
        }
        for conn_id in gone {
            self.remove(&conn_id, Removal::Gone);
        }
    }

    fn shutdown(&mut self) {
        let handles = self.registry.drain();
        info!(connections = handles.len(), "Hub shutting down");
        for handle in handles {
            handle.close();
            self.presence.offline(handle.user_id, &handle.room_id);
            debug!(conn_id = %handle.id, reason = ?Removal::Shutdown, "Connection closed");
        }
    }
}
