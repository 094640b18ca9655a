//! Transport-neutral view of inbound socket traffic.
//!
//! The HTTP layer adapts its WebSocket into a stream of [`TransportFrame`]
//! and a sink of payloads, which keeps the pumps testable over plain
//! channels.

/// An inbound frame as the pumps see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFrame {
    /// A text frame carrying one JSON envelope.
    Text(String),
    /// The peer closed the connection.
    Close,
}
