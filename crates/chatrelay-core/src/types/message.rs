//! Durable chat message records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Status recorded on every newly stored message.
pub const MESSAGE_STATUS_SENT: &str = "sent";

/// Emoji reactions on a message: emoji to the set of users who reacted.
///
/// Adding the same `(emoji, user)` pair twice keeps one entry; removing a
/// pair that is not present is a no-op. An emoji whose user set becomes
/// empty is dropped from the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reactions(BTreeMap<String, BTreeSet<UserId>>);

impl Reactions {
    /// Create an empty reaction map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `user_id` under `emoji`. Returns `true` if it was not present.
    pub fn add(&mut self, emoji: &str, user_id: UserId) -> bool {
        self.0.entry(emoji.to_string()).or_default().insert(user_id)
    }

    /// Remove `user_id` from `emoji`. Returns `true` if it was present.
    pub fn remove(&mut self, emoji: &str, user_id: UserId) -> bool {
        let Some(users) = self.0.get_mut(emoji) else {
            return false;
        };
        let removed = users.remove(&user_id);
        if users.is_empty() {
            self.0.remove(emoji);
        }
        removed
    }

    /// Users who reacted with `emoji`.
    pub fn users(&self, emoji: &str) -> Option<&BTreeSet<UserId>> {
        self.0.get(emoji)
    }

    /// Whether no reactions are recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(emoji, users)` pairs in emoji order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<UserId>)> {
        self.0.iter()
    }
}

impl FromIterator<(String, UserId)> for Reactions {
    fn from_iter<I: IntoIterator<Item = (String, UserId)>>(iter: I) -> Self {
        let mut reactions = Self::new();
        for (emoji, user_id) in iter {
            reactions.add(&emoji, user_id);
        }
        reactions
    }
}

/// A message as stored by the message store.
///
/// `id` and `timestamp` are assigned by the store on insert and never
/// change afterwards. Deleted messages stay in storage with `deleted` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Store-assigned identifier.
    pub id: String,
    /// Room the message was posted to.
    pub room_id: String,
    /// Author.
    pub sender_id: UserId,
    /// Text body; may be empty when an attachment is present.
    pub content: String,
    /// Unix seconds at insert.
    pub timestamp: i64,
    /// Whether the room is a group room.
    pub is_group: bool,
    /// Delivery status (`"sent"` on insert).
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    /// Soft-delete flag.
    pub deleted: bool,
    /// Emoji reactions.
    #[serde(default)]
    pub reactions: Reactions,
}

/// Input to [`crate::traits::MessageStore::insert`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: String,
    pub sender_id: UserId,
    pub content: String,
    pub is_group: bool,
    pub attachment_url: Option<String>,
    pub attachment_type: Option<String>,
    pub reply_to_id: Option<String>,
}

impl NewMessage {
    /// Whether the message carries neither text nor an attachment.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
            && self
                .attachment_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
    }
}
