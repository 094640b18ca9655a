//! Redis presence store.

pub mod client;
pub mod presence;

pub use client::RedisClient;
pub use presence::RedisPresenceStore;
