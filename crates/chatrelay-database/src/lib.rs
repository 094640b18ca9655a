//! # chatrelay-database
//!
//! Durable storage for ChatRelay: PostgreSQL connection management,
//! migrations, the PostgreSQL message and user stores, and in-memory
//! equivalents used for local runs and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod stores;

pub use connection::DatabasePool;
pub use memory::{MemoryMessageStore, MemoryUserStore};
pub use repositories::{PgMessageStore, UserRepository};
pub use stores::Stores;
