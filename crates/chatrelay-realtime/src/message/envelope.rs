//! The JSON envelope exchanged in both directions over a socket.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use chatrelay_core::types::{ChatMessage, NewMessage, UserId};

/// Envelope `type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Message,
    Typing,
    Reaction,
    Deletion,
    Ping,
    Pong,
    Error,
    /// Any `type` this server does not recognise.
    #[serde(other)]
    Unknown,
}

/// One unit of socket traffic.
///
/// Fields this struct does not model (`username`, `is_typing`, ...) are kept
/// in `extra` so a re-encoded envelope loses nothing the client sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub sender_id: UserId,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Target user of a reaction or typing event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Unix seconds, assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// A bare envelope of the given kind.
    pub fn new(kind: EnvelopeKind) -> Self {
        Self {
            kind,
            room_id: String::new(),
            sender_id: 0,
            content: String::new(),
            message_id: None,
            is_group: false,
            attachment_url: None,
            attachment_type: None,
            reply_to_id: None,
            emoji: None,
            user_id: None,
            action: None,
            timestamp: None,
            error: None,
            extra: Map::new(),
        }
    }

    /// Whether a store-assigned id is already attached.
    pub fn has_message_id(&self) -> bool {
        self.message_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Whether there is text or an attachment to store.
    pub fn has_body(&self) -> bool {
        !self.content.trim().is_empty()
            || self
                .attachment_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty())
    }

    /// The insert request for this envelope, authored by `sender_id`.
    pub fn to_new_message(&self, sender_id: UserId) -> NewMessage {
        NewMessage {
            room_id: self.room_id.clone(),
            sender_id,
            content: self.content.clone(),
            is_group: self.is_group,
            attachment_url: non_empty(&self.attachment_url),
            attachment_type: non_empty(&self.attachment_type),
            reply_to_id: non_empty(&self.reply_to_id),
        }
    }

    /// Copy the store-assigned identity onto this envelope.
    pub fn apply_stored(&mut self, stored: &ChatMessage) {
        self.message_id = Some(stored.id.clone());
        self.timestamp = Some(stored.timestamp);
        self.sender_id = stored.sender_id;
        self.room_id = stored.room_id.clone();
    }
}

impl From<&ChatMessage> for Envelope {
    fn from(message: &ChatMessage) -> Self {
        Self {
            room_id: message.room_id.clone(),
            sender_id: message.sender_id,
            content: message.content.clone(),
            message_id: Some(message.id.clone()),
            is_group: message.is_group,
            attachment_url: message.attachment_url.clone(),
            attachment_type: message.attachment_type.clone(),
            reply_to_id: message.reply_to_id.clone(),
            timestamp: Some(message.timestamp),
            ..Self::new(EnvelopeKind::Message)
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}
