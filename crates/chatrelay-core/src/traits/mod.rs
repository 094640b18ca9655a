//! Gateway traits defined in `chatrelay-core` and implemented by the
//! storage crates.

pub mod message_store;
pub mod presence;
pub mod user_store;

pub use message_store::MessageStore;
pub use presence::PresenceStore;
pub use user_store::UserStore;
