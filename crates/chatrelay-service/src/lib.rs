//! # chatrelay-service
//!
//! Business logic behind the HTTP side channel. Each service orchestrates
//! the message, user, and presence stores, and publishes to the realtime
//! hub whenever it changes something connected clients should see.
//!
//! Services follow constructor injection: all dependencies are provided at
//! construction time via `Arc` references.

pub mod context;
pub mod message;
pub mod presence;
pub mod user;

pub use context::RequestContext;
pub use message::{MessageService, SubmitMessage};
pub use presence::{PresenceService, UserStatus};
pub use user::UserService;
