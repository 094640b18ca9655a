//! In-memory store implementations for local runs and tests.

pub mod message;
pub mod user;

pub use message::MemoryMessageStore;
pub use user::MemoryUserStore;
