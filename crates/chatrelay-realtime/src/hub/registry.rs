//! Connection and room bookkeeping owned by the hub task.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chatrelay_core::types::ConnectionId;

use super::command::HubSnapshot;
use crate::connection::ConnectionHandle;

/// The global connection set plus per-room membership.
///
/// Every mutation keeps the two views consistent: a connection is in its
/// room's set exactly when it is in the global set, and a room with no
/// members is removed.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    connections: HashMap<ConnectionId, Arc<ConnectionHandle>>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

impl Registry {
    /// Add a connection to the global set and its room. Returns `false` if
    /// the id is already registered.
    pub(crate) fn insert(&mut self, handle: Arc<ConnectionHandle>) -> bool {
        if self.connections.contains_key(&handle.id) {
            return false;
        }
        self.rooms
            .entry(handle.room_id.clone())
            .or_default()
            .insert(handle.id);
        self.connections.insert(handle.id, handle);
        true
    }

    /// Remove a connection from both views, dropping its room if it empties.
    pub(crate) fn remove(&mut self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let handle = self.connections.remove(conn_id)?;
        if let Some(members) = self.rooms.get_mut(&handle.room_id) {
            members.remove(conn_id);
            if members.is_empty() {
                self.rooms.remove(&handle.room_id);
            }
        }
        Some(handle)
    }

    /// Handles of the connections in `room_id`.
    pub(crate) fn members(&self, room_id: &str) -> Vec<Arc<ConnectionHandle>> {
        self.rooms
            .get(room_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.connections.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove and return every connection.
    pub(crate) fn drain(&mut self) -> Vec<Arc<ConnectionHandle>> {
        self.rooms.clear();
        self.connections.drain().map(|(_, handle)| handle).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    pub(crate) fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            connections: self.connections.len(),
            rooms: self
                .rooms
                .iter()
                .map(|(room, ids)| {
                    let mut ids: Vec<_> = ids.iter().copied().collect();
                    ids.sort();
                    (room.clone(), ids)
                })
                .collect(),
        }
    }

    /// Check both membership invariants. Used by tests.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let no_empty_rooms = self.rooms.values().all(|m| !m.is_empty());
        let rooms_in_global = self.rooms.iter().all(|(room, members)| {
            members.iter().all(|id| {
                self.connections
                    .get(id)
                    .is_some_and(|h| &h.room_id == room)
            })
        });
        let global_in_rooms = self.connections.values().all(|h| {
            self.rooms
                .get(&h.room_id)
                .is_some_and(|m| m.contains(&h.id))
        });
        no_empty_rooms && rooms_in_global && global_in_rooms
    }
}
