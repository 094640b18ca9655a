//! Message operations for the HTTP side channel.
//!
//! Every mutation is written to the message store first and then published
//! to the message's room. Published envelopes always carry the assigned
//! message id, so socket clients that echo them back are relayed without a
//! second insert.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use chatrelay_core::error::AppError;
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::MessageStore;
use chatrelay_core::types::{ChatMessage, NewMessage};
use chatrelay_realtime::hub::Hub;
use chatrelay_realtime::message::{Envelope, OutboundFrame, ReactionAction, encode_frame};

use crate::context::RequestContext;

/// A message submitted over HTTP.
#[derive(Debug, Clone, Default)]
pub struct SubmitMessage {
    pub room_id: String,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
    pub attachment_type: Option<String>,
    pub is_group: bool,
    pub reply_to_id: Option<String>,
}

/// Submits, lists, reacts to, and deletes messages.
#[derive(Debug, Clone)]
pub struct MessageService {
    /// Message store.
    store: Arc<dyn MessageStore>,
    /// Realtime hub for room broadcasts.
    hub: Hub,
}

impl MessageService {
    /// Creates a new message service.
    pub fn new(store: Arc<dyn MessageStore>, hub: Hub) -> Self {
        Self { store, hub }
    }

    /// Store a message from the authenticated user and broadcast it.
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        req: SubmitMessage,
    ) -> AppResult<ChatMessage> {
        let room_id = require_room(&req.room_id)?;
        let new_message = NewMessage {
            room_id: room_id.to_string(),
            sender_id: ctx.user_id,
            content: req.content.unwrap_or_default(),
            is_group: req.is_group,
            attachment_url: non_blank(req.attachment_url),
            attachment_type: non_blank(req.attachment_type),
            reply_to_id: non_blank(req.reply_to_id),
        };
        if new_message.is_empty() {
            return Err(AppError::validation("Empty message"));
        }

        let message = self.store.insert(new_message).await?;
        info!(
            message_id = %message.id,
            room_id = %message.room_id,
            user_id = ctx.user_id,
            "Message submitted"
        );

        self.publish(&message.room_id, &Envelope::from(&message)).await;
        Ok(message)
    }

    /// All messages in a room, oldest first, deleted ones included.
    pub async fn history(&self, room_id: &str) -> AppResult<Vec<ChatMessage>> {
        let room_id = require_room(room_id)?;
        self.store.fetch_by_room(room_id).await
    }

    /// Fetch one message.
    pub async fn get(&self, message_id: &str) -> AppResult<ChatMessage> {
        self.store
            .fetch_by_id(message_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Message {message_id} not found")))
    }

    /// Add or remove the caller's reaction and broadcast the change to the
    /// message's room.
    pub async fn react(
        &self,
        ctx: &RequestContext,
        message_id: &str,
        emoji: &str,
        action: ReactionAction,
    ) -> AppResult<()> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(AppError::validation("Emoji is required"));
        }

        let message = self.get(message_id).await?;
        match action {
            ReactionAction::Add => {
                self.store
                    .add_reaction(&message.id, emoji, ctx.user_id)
                    .await?
            }
            ReactionAction::Remove => {
                self.store
                    .remove_reaction(&message.id, emoji, ctx.user_id)
                    .await?
            }
        }

        let frame = OutboundFrame::Reaction {
            message_id: message.id,
            room_id: message.room_id.clone(),
            user_id: ctx.user_id,
            emoji: emoji.to_string(),
            action,
        };
        self.publish(&message.room_id, &frame).await;
        Ok(())
    }

    /// Soft-delete a message. Only its sender may do this; deleting twice
    /// succeeds.
    pub async fn delete(&self, ctx: &RequestContext, message_id: &str) -> AppResult<()> {
        let message = self.get(message_id).await?;
        if message.sender_id != ctx.user_id {
            return Err(AppError::authorization(
                "Only the sender can delete this message",
            ));
        }

        self.store.mark_deleted(&message.id).await?;
        info!(message_id = %message.id, user_id = ctx.user_id, "Message deleted");

        let frame = OutboundFrame::Deletion {
            message_id: message.id,
            room_id: message.room_id.clone(),
            sender_id: message.sender_id,
        };
        self.publish(&message.room_id, &frame).await;
        Ok(())
    }

    /// Broadcast after a committed write. The write stands even if the
    /// broadcast fails.
    async fn publish<T: Serialize>(&self, room_id: &str, frame: &T) {
        let result = match encode_frame(frame) {
            Ok(payload) => self.hub.publish(room_id, payload).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(room_id, error = %e, "Failed to broadcast side-channel update");
        }
    }
}

fn require_room(room_id: &str) -> AppResult<&str> {
    let room_id = room_id.trim();
    if room_id.is_empty() {
        return Err(AppError::validation("room_id is required"));
    }
    Ok(room_id)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
