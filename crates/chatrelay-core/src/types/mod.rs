//! Core type definitions used across the ChatRelay workspace.

pub mod id;
pub mod message;
pub mod user;

pub use id::*;
pub use message::{ChatMessage, NewMessage, Reactions, MESSAGE_STATUS_SENT};
pub use user::{NewUser, User};
