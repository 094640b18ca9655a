//! Best-effort presence side effects of joins and leaves.

pub mod relay;

pub use relay::{PresenceRelay, PresenceUpdate};
