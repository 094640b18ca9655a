//! Presence queries.

pub mod service;

pub use service::{PresenceService, UserStatus};
