//! Presence store contract.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::UserId;

/// Ephemeral online/last-seen tracking (Redis or in-memory).
///
/// Writes are last-write-wins with a TTL on the online marker. Callers in
/// the connection lifecycle treat every error as non-fatal.
#[async_trait]
pub trait PresenceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Mark a user online in a room, refreshing the expiry.
    async fn set_online(&self, user_id: UserId, room_id: &str) -> AppResult<()>;

    /// Clear the online marker and record the last-seen time.
    async fn set_offline(&self, user_id: UserId, room_id: &str) -> AppResult<()>;

    /// Whether the user currently has a live online marker.
    async fn is_online(&self, user_id: UserId) -> AppResult<bool>;

    /// Users marked online in a room, in ascending id order.
    async fn list_online(&self, room_id: &str) -> AppResult<Vec<UserId>>;

    /// Unix seconds of the user's last disconnect, if ever recorded.
    async fn last_seen(&self, user_id: UserId) -> AppResult<Option<i64>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
