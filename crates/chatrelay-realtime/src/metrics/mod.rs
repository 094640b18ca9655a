//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters, shared by the hub, the pumps, and the presence
/// relay.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    frames_received: AtomicU64,
    /// Malformed or oversized inbound frames.
    frames_dropped: AtomicU64,
    envelopes_published: AtomicU64,
    /// Payloads accepted into a connection's outbound queue.
    deliveries: AtomicU64,
    /// Connections removed because their outbound queue was full.
    evictions: AtomicU64,
    /// Direct replies (pong, error) dropped on a full queue.
    replies_dropped: AtomicU64,
    persistence_failures: AtomicU64,
    presence_failures: AtomicU64,
}

impl EngineMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn envelope_published(&self) {
        self.envelopes_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self, count: u64) {
        self.deliveries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reply_dropped(&self) {
        self.replies_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn persistence_failure(&self) {
        self.persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn presence_failure(&self) {
        self.presence_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        MetricsSnapshot {
            connections_opened: opened,
            connections_closed: closed,
            connections_active: opened.saturating_sub(closed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            envelopes_published: self.envelopes_published.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            replies_dropped: self.replies_dropped.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            presence_failures: self.presence_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub connections_active: u64,
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub envelopes_published: u64,
    pub deliveries: u64,
    pub evictions: u64,
    pub replies_dropped: u64,
    pub persistence_failures: u64,
    pub presence_failures: u64,
}
