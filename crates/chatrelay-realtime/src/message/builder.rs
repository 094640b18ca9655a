//! Frames originated by the server rather than relayed from a client.

use serde::{Deserialize, Serialize};

use chatrelay_core::types::UserId;

/// Whether a reaction was added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionAction {
    Add,
    Remove,
}

/// Server-built frames. Chat messages reuse [`super::Envelope`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Answer to a client ping.
    Pong,
    /// Sent to one connection only.
    Error { error: String },
    /// A reaction applied through the HTTP side channel.
    Reaction {
        message_id: String,
        room_id: String,
        user_id: UserId,
        emoji: String,
        action: ReactionAction,
    },
    /// A soft delete applied through the HTTP side channel.
    Deletion {
        message_id: String,
        room_id: String,
        sender_id: UserId,
    },
}

impl OutboundFrame {
    /// An error frame with the given text.
    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            error: reason.into(),
        }
    }
}
