//! Presence key builders.
//!
//! The layout matches what existing deployments already hold in Redis:
//! `user:{id}` stores the room a user is online in, `room:{room}:users`
//! is the set of online user ids, and `user:{id}:last_seen` holds unix
//! seconds without expiry.

use chatrelay_core::types::UserId;

/// Online marker for a user. Value is the room id; expires.
pub fn user_online(user_id: UserId) -> String {
    format!("user:{user_id}")
}

/// Set of user ids online in a room. Expires, refreshed on every join.
pub fn room_users(room_id: &str) -> String {
    format!("room:{room_id}:users")
}

/// Last disconnect time of a user in unix seconds. Never expires.
pub fn user_last_seen(user_id: UserId) -> String {
    format!("user:{user_id}:last_seen")
}
