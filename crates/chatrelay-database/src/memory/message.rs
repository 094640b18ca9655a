//! In-memory message store backed by DashMap.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use chatrelay_core::error::AppError;
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::MessageStore;
use chatrelay_core::types::{ChatMessage, NewMessage, Reactions, UserId, MESSAGE_STATUS_SENT};

#[derive(Debug)]
struct StoredMessage {
    /// Insertion order, breaks timestamp ties.
    seq: u64,
    message: ChatMessage,
}

/// [`MessageStore`] kept entirely in process memory.
///
/// Each entry is mutated under its DashMap shard lock, so reaction updates
/// and soft deletes are atomic per message.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    messages: DashMap<String, StoredMessage>,
    next_seq: AtomicU64,
}

impl MemoryMessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages, deleted ones included.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the store holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn update<F>(&self, id: &str, f: F) -> AppResult<()>
    where
        F: FnOnce(&mut ChatMessage),
    {
        let mut entry = self
            .messages
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Message {id} not found")))?;
        f(&mut entry.message);
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(&self, message: NewMessage) -> AppResult<ChatMessage> {
        let stored = ChatMessage {
            id: Uuid::now_v7().simple().to_string(),
            room_id: message.room_id,
            sender_id: message.sender_id,
            content: message.content,
            timestamp: Utc::now().timestamp(),
            is_group: message.is_group,
            status: MESSAGE_STATUS_SENT.to_string(),
            attachment_url: message.attachment_url,
            attachment_type: message.attachment_type,
            reply_to_id: message.reply_to_id,
            deleted: false,
            reactions: Reactions::new(),
        };

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.messages.insert(
            stored.id.clone(),
            StoredMessage {
                seq,
                message: stored.clone(),
            },
        );
        Ok(stored)
    }

    async fn mark_deleted(&self, id: &str) -> AppResult<()> {
        self.update(id, |m| m.deleted = true)
    }

    async fn add_reaction(&self, id: &str, emoji: &str, user_id: UserId) -> AppResult<()> {
        self.update(id, |m| {
            m.reactions.add(emoji, user_id);
        })
    }

    async fn remove_reaction(&self, id: &str, emoji: &str, user_id: UserId) -> AppResult<()> {
        self.update(id, |m| {
            m.reactions.remove(emoji, user_id);
        })
    }

    async fn fetch_by_room(&self, room_id: &str) -> AppResult<Vec<ChatMessage>> {
        let mut found: Vec<(i64, u64, ChatMessage)> = self
            .messages
            .iter()
            .filter(|entry| entry.message.room_id == room_id)
            .map(|entry| (entry.message.timestamp, entry.seq, entry.message.clone()))
            .collect();
        found.sort_by_key(|(ts, seq, _)| (*ts, *seq));
        Ok(found.into_iter().map(|(_, _, m)| m).collect())
    }

    async fn fetch_by_id(&self, id: &str) -> AppResult<Option<ChatMessage>> {
        Ok(self.messages.get(id).map(|entry| entry.message.clone()))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
