//! Requests processed by the hub's owner task.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use chatrelay_core::types::ConnectionId;

use crate::connection::ConnectionHandle;

/// One request to the hub. Requests are applied strictly in queue order.
#[derive(Debug)]
pub enum HubCommand {
    /// Register a connection in the global set and in its room.
    Join {
        handle: Arc<ConnectionHandle>,
        ack: oneshot::Sender<()>,
    },
    /// Remove a connection. Unknown ids are ignored.
    Leave { conn_id: ConnectionId },
    /// Fan a payload out to every connection in a room.
    Publish { room_id: String, payload: Arc<str> },
    /// Report the current registry contents.
    Snapshot { reply: oneshot::Sender<HubSnapshot> },
    /// Close every connection and stop the owner task.
    Shutdown { ack: oneshot::Sender<()> },
}

/// Point-in-time view of the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSnapshot {
    /// Size of the global connection set.
    pub connections: usize,
    /// Room id to member connection ids, sorted.
    pub rooms: BTreeMap<String, Vec<ConnectionId>>,
}

impl HubSnapshot {
    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Members of one room, empty if the room does not exist.
    pub fn members(&self, room_id: &str) -> &[ConnectionId] {
        self.rooms.get(room_id).map(Vec::as_slice).unwrap_or(&[])
    }
}
