//! Real-time hub and connection pump configuration.

use serde::{Deserialize, Serialize};

/// Queue bounds and frame limits for the realtime core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound queue bound. A connection whose queue is full
    /// when a publish arrives is evicted.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue_capacity: usize,
    /// Bound on pending hub commands.
    #[serde(default = "default_hub_queue")]
    pub hub_queue_capacity: usize,
    /// Bound on pending presence updates.
    #[serde(default = "default_presence_queue")]
    pub presence_queue_capacity: usize,
    /// Inbound text frames larger than this are dropped.
    #[serde(default = "default_max_frame")]
    pub max_frame_bytes: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: default_outbound_queue(),
            hub_queue_capacity: default_hub_queue(),
            presence_queue_capacity: default_presence_queue(),
            max_frame_bytes: default_max_frame(),
        }
    }
}

fn default_outbound_queue() -> usize {
    256
}

fn default_hub_queue() -> usize {
    1024
}

fn default_presence_queue() -> usize {
    1024
}

fn default_max_frame() -> usize {
    65536
}
