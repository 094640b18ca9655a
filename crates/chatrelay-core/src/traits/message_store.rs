//! Durable message store contract.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{ChatMessage, NewMessage, UserId};

/// Durable storage for chat messages (PostgreSQL or in-memory).
///
/// Implementations provide their own atomicity: reaction updates are set
/// operations and deletion only flips the `deleted` flag. Failures are
/// reported as [`crate::error::ErrorKind::Database`].
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug + 'static {
    /// Store a new message, assigning its id, timestamp, and `"sent"` status.
    ///
    /// Must complete before the message is broadcast.
    async fn insert(&self, message: NewMessage) -> AppResult<ChatMessage>;

    /// Soft-delete a message. Deleting an already-deleted message succeeds.
    ///
    /// Returns a not-found error for an unknown id.
    async fn mark_deleted(&self, id: &str) -> AppResult<()>;

    /// Add `user_id` to the `emoji` reaction set of a message.
    async fn add_reaction(&self, id: &str, emoji: &str, user_id: UserId) -> AppResult<()>;

    /// Remove `user_id` from the `emoji` reaction set. Removing a user that
    /// never reacted is a no-op.
    async fn remove_reaction(&self, id: &str, emoji: &str, user_id: UserId) -> AppResult<()>;

    /// All messages of a room, oldest first, soft-deleted ones included.
    async fn fetch_by_room(&self, room_id: &str) -> AppResult<Vec<ChatMessage>>;

    /// A single message by id.
    async fn fetch_by_id(&self, id: &str) -> AppResult<Option<ChatMessage>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
