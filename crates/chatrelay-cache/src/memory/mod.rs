//! In-process presence store.

pub mod presence;

pub use presence::MemoryPresenceStore;
