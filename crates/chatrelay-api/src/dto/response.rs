//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chatrelay_core::types::{ChatMessage, User, UserId};

/// Generic one-line reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Acknowledges a side-channel mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// Result of `POST /message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMessageResponse {
    pub status: String,
    pub message_id: String,
    pub timestamp: i64,
    pub room_id: String,
    pub sender_id: UserId,
}

impl From<&ChatMessage> for SubmitMessageResponse {
    fn from(message: &ChatMessage) -> Self {
        Self {
            status: "Message stored".to_string(),
            message_id: message.id.clone(),
            timestamp: message.timestamp,
            room_id: message.room_id.clone(),
            sender_id: message.sender_id,
        }
    }
}

/// Room history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatMessage>,
    pub total_count: usize,
    pub room_id: String,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Bearer token issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Users online in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineUsersResponse {
    pub users: Vec<UserId>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when a store health check fails.
    pub status: String,
    pub version: String,
    /// Live socket connections.
    pub connections: usize,
    /// Rooms with at least one connection.
    pub rooms: usize,
    /// Envelopes fanned out by the hub.
    pub messages_relayed: u64,
    /// Slow consumers disconnected.
    pub evictions: u64,
}
