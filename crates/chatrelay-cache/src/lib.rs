//! # chatrelay-cache
//!
//! Presence store implementations for ChatRelay. Supports two modes:
//!
//! - **memory**: In-process presence using [moka](https://crates.io/crates/moka)
//!   TTL caches and [dashmap](https://crates.io/crates/dashmap) room sets
//! - **redis**: Redis-backed presence using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::PresenceManager;
