//! Per-connection state and pumps.

pub mod authenticator;
pub mod endpoint;
pub mod handle;
pub mod transport;

pub use authenticator::{Handshake, WsAuthenticator};
pub use endpoint::ConnectionEndpoint;
pub use handle::{ConnectionHandle, SendError};
pub use transport::TransportFrame;
