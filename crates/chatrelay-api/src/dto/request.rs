//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use chatrelay_core::types::UserId;
use chatrelay_service::SubmitMessage;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Message submission body. At least one of `content` and
/// `attachment_url` must be non-blank; the service checks that.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitMessageRequest {
    #[validate(length(min = 1, message = "room_id is required"))]
    pub room_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub attachment_type: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

impl From<SubmitMessageRequest> for SubmitMessage {
    fn from(req: SubmitMessageRequest) -> Self {
        Self {
            room_id: req.room_id,
            content: req.content,
            attachment_url: req.attachment_url,
            attachment_type: req.attachment_type,
            is_group: req.is_group,
            reply_to_id: req.reply_to_id,
        }
    }
}

/// Add or remove a reaction.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReactionRequest {
    #[validate(length(min = 1, message = "message_id is required"))]
    pub message_id: String,
    #[validate(length(min = 1, message = "emoji is required"))]
    pub emoji: String,
}

/// Soft-delete a message.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeleteMessageRequest {
    #[validate(length(min = 1, message = "message_id is required"))]
    pub message_id: String,
}

/// `GET /messages` query.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub room_id: String,
}

/// `GET /online-users` query.
#[derive(Debug, Clone, Deserialize)]
pub struct OnlineUsersQuery {
    #[serde(default)]
    pub room: String,
}

/// `GET /user-status` query.
#[derive(Debug, Clone, Deserialize)]
pub struct UserStatusQuery {
    pub user: UserId,
}

/// Socket handshake parameters. Both are optional here so that a missing
/// one is reported as a 400 rather than a query rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsQuery {
    pub room: Option<String>,
    pub token: Option<String>,
}
