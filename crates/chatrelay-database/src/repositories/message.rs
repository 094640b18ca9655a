//! PostgreSQL message store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use chatrelay_core::error::{AppError, ErrorKind};
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::MessageStore;
use chatrelay_core::types::{ChatMessage, NewMessage, Reactions, UserId, MESSAGE_STATUS_SENT};

const MESSAGE_COLUMNS: &str = "id, room_id, sender_id, content, timestamp, is_group, status, \
     attachment_url, attachment_type, reply_to_id, deleted";

/// Row shape of the `messages` table.
#[derive(Debug, FromRow)]
struct MessageRow {
    id: String,
    room_id: String,
    sender_id: i64,
    content: String,
    timestamp: i64,
    is_group: bool,
    status: String,
    attachment_url: Option<String>,
    attachment_type: Option<String>,
    reply_to_id: Option<String>,
    deleted: bool,
}

impl MessageRow {
    fn into_message(self, reactions: Reactions) -> ChatMessage {
        ChatMessage {
            id: self.id,
            room_id: self.room_id,
            sender_id: self.sender_id,
            content: self.content,
            timestamp: self.timestamp,
            is_group: self.is_group,
            status: self.status,
            attachment_url: self.attachment_url,
            attachment_type: self.attachment_type,
            reply_to_id: self.reply_to_id,
            deleted: self.deleted,
            reactions,
        }
    }
}

/// [`MessageStore`] over the `messages` and `message_reactions` tables.
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    /// Create a new message store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM messages WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up message", e))
    }

    async fn reactions_for(&self, ids: &[String]) -> AppResult<HashMap<String, Reactions>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT message_id, emoji, user_id FROM message_reactions WHERE message_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load reactions", e))?;

        let mut grouped: HashMap<String, Reactions> = HashMap::new();
        for (message_id, emoji, user_id) in rows {
            grouped.entry(message_id).or_default().add(&emoji, user_id);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn insert(&self, message: NewMessage) -> AppResult<ChatMessage> {
        let id = Uuid::now_v7().simple().to_string();
        let timestamp = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO messages (id, room_id, sender_id, content, timestamp, is_group, status, \
             attachment_url, attachment_type, reply_to_id, deleted) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE)",
        )
        .bind(&id)
        .bind(&message.room_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(timestamp)
        .bind(message.is_group)
        .bind(MESSAGE_STATUS_SENT)
        .bind(&message.attachment_url)
        .bind(&message.attachment_type)
        .bind(&message.reply_to_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert message", e))?;

        Ok(ChatMessage {
            id,
            room_id: message.room_id,
            sender_id: message.sender_id,
            content: message.content,
            timestamp,
            is_group: message.is_group,
            status: MESSAGE_STATUS_SENT.to_string(),
            attachment_url: message.attachment_url,
            attachment_type: message.attachment_type,
            reply_to_id: message.reply_to_id,
            deleted: false,
            reactions: Reactions::new(),
        })
    }

    async fn mark_deleted(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE messages SET deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark message deleted", e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Message {id} not found")));
        }
        Ok(())
    }

    async fn add_reaction(&self, id: &str, emoji: &str, user_id: UserId) -> AppResult<()> {
        if !self.exists(id).await? {
            return Err(AppError::not_found(format!("Message {id} not found")));
        }

        sqlx::query(
            "INSERT INTO message_reactions (message_id, emoji, user_id) VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(emoji)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to add reaction", e))?;
        Ok(())
    }

    async fn remove_reaction(&self, id: &str, emoji: &str, user_id: UserId) -> AppResult<()> {
        if !self.exists(id).await? {
            return Err(AppError::not_found(format!("Message {id} not found")));
        }

        sqlx::query(
            "DELETE FROM message_reactions WHERE message_id = $1 AND emoji = $2 AND user_id = $3",
        )
        .bind(id)
        .bind(emoji)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove reaction", e))?;
        Ok(())
    }

    async fn fetch_by_room(&self, room_id: &str) -> AppResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE room_id = $1 ORDER BY timestamp ASC, seq ASC"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch room messages", e))?;

        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut reactions = self.reactions_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let r = reactions.remove(&row.id).unwrap_or_default();
                row.into_message(r)
            })
            .collect())
    }

    async fn fetch_by_id(&self, id: &str) -> AppResult<Option<ChatMessage>> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch message", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut reactions = self.reactions_for(std::slice::from_ref(&row.id)).await?;
        let r = reactions.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_message(r)))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}
