//! Decide what an inbound envelope triggers.

use super::envelope::{Envelope, EnvelopeKind};

/// Error text sent back for a message without text or attachment.
pub const EMPTY_MESSAGE: &str = "Empty message";

/// The action an inbound envelope calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Answer the sender with `{type:"pong"}`; nothing reaches the room.
    ReplyOnly,
    /// Relay to the room as-is; nothing is stored.
    BroadcastOnly,
    /// Store first, then relay carrying the assigned id and timestamp.
    PersistThenBroadcast,
    /// Send an error frame with this text to the sender only.
    Reject(&'static str),
    /// Ignore.
    Discard,
}

/// Classify an envelope. Pure; looks at nothing but the envelope.
///
/// Reactions and deletions arriving over a socket have already been applied
/// through the HTTP side channel, and a message that carries an id has
/// already been stored, so all of them are relay-only.
pub fn classify(envelope: &Envelope) -> Disposition {
    match envelope.kind {
        EnvelopeKind::Ping => Disposition::ReplyOnly,
        EnvelopeKind::Typing | EnvelopeKind::Reaction | EnvelopeKind::Deletion => {
            Disposition::BroadcastOnly
        }
        EnvelopeKind::Message if envelope.has_message_id() => Disposition::BroadcastOnly,
        EnvelopeKind::Message if !envelope.has_body() => Disposition::Reject(EMPTY_MESSAGE),
        EnvelopeKind::Message => Disposition::PersistThenBroadcast,
        EnvelopeKind::Pong | EnvelopeKind::Error | EnvelopeKind::Unknown => Disposition::Discard,
    }
}
