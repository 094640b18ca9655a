//! Serialized, non-blocking delivery of presence updates.
//!
//! The hub must never wait on the presence store, yet a user's online and
//! offline writes have to land in the order the hub produced them. Updates
//! therefore go through one bounded queue drained by a single task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use chatrelay_core::traits::PresenceStore;
use chatrelay_core::types::UserId;

use crate::metrics::EngineMetrics;

/// One presence write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceUpdate {
    Online { user_id: UserId, room_id: String },
    Offline { user_id: UserId, room_id: String },
}

/// Sending half of the presence queue.
#[derive(Debug, Clone)]
pub struct PresenceRelay {
    tx: mpsc::Sender<PresenceUpdate>,
    metrics: Arc<EngineMetrics>,
}

impl PresenceRelay {
    /// Spawn the worker that applies updates to `store`.
    ///
    /// The worker exits once every `PresenceRelay` clone is dropped and the
    /// queue is drained.
    pub fn spawn(
        store: Arc<dyn PresenceStore>,
        capacity: usize,
        metrics: Arc<EngineMetrics>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(store, rx, metrics.clone()));
        (Self { tx, metrics }, worker)
    }

    /// Queue a SetOnline.
    pub fn online(&self, user_id: UserId, room_id: &str) {
        self.enqueue(PresenceUpdate::Online {
            user_id,
            room_id: room_id.to_string(),
        });
    }

    /// Queue a SetOffline.
    pub fn offline(&self, user_id: UserId, room_id: &str) {
        self.enqueue(PresenceUpdate::Offline {
            user_id,
            room_id: room_id.to_string(),
        });
    }

    fn enqueue(&self, update: PresenceUpdate) {
        match self.tx.try_send(update) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(update)) => {
                self.metrics.presence_failure();
                warn!(?update, "Presence queue full, dropping update");
            }
            Err(mpsc::error::TrySendError::Closed(update)) => {
                debug!(?update, "Presence worker stopped, dropping update");
            }
        }
    }
}

async fn run_worker(
    store: Arc<dyn PresenceStore>,
    mut rx: mpsc::Receiver<PresenceUpdate>,
    metrics: Arc<EngineMetrics>,
) {
    while let Some(update) = rx.recv().await {
        let result = match &update {
            PresenceUpdate::Online { user_id, room_id } => {
                store.set_online(*user_id, room_id).await
            }
            PresenceUpdate::Offline { user_id, room_id } => {
                store.set_offline(*user_id, room_id).await
            }
        };

        if let Err(e) = result {
            metrics.presence_failure();
            warn!(?update, error = %e, "Presence update failed");
        }
    }
    debug!("Presence relay stopped");
}
