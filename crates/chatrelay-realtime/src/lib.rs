//! # chatrelay-realtime
//!
//! Real-time core of ChatRelay. Provides:
//!
//! - A connection hub that owns room membership and fans payloads out
//!   without blocking on slow readers
//! - Per-connection inbound and outbound pumps
//! - Envelope decoding and classification
//! - Ordered, non-blocking presence updates
//! - Engine-level metrics

pub mod connection;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod server;

pub use connection::{ConnectionHandle, Handshake, TransportFrame, WsAuthenticator};
pub use hub::{Hub, HubSnapshot};
pub use message::{Envelope, EnvelopeKind, OutboundFrame, ReactionAction};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use server::RealtimeEngine;
