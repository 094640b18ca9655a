//! Message submission, history, reactions, and deletion.

pub mod service;

pub use service::{MessageService, SubmitMessage};
