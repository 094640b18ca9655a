//! Message side-channel handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use chatrelay_core::types::ChatMessage;
use chatrelay_realtime::ReactionAction;

use crate::dto::request::{
    DeleteMessageRequest, HistoryQuery, ReactionRequest, SubmitMessageRequest,
};
use crate::dto::response::{HistoryResponse, StatusResponse, SubmitMessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /message
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<SubmitMessageRequest>,
) -> Result<Json<SubmitMessageResponse>, ApiError> {
    let message = state
        .message_service
        .submit(auth.context(), req.into())
        .await?;
    Ok(Json(SubmitMessageResponse::from(&message)))
}

/// GET /messages?room_id=
pub async fn history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state.message_service.history(&query.room_id).await?;
    Ok(Json(HistoryResponse {
        total_count: messages.len(),
        room_id: query.room_id.trim().to_string(),
        messages,
    }))
}

/// GET /message/{id}
pub async fn get_message(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ChatMessage>, ApiError> {
    Ok(Json(state.message_service.get(&id).await?))
}

/// POST /message/reaction/add
pub async fn add_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ReactionRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .message_service
        .react(auth.context(), &req.message_id, &req.emoji, ReactionAction::Add)
        .await?;
    Ok(Json(StatusResponse::new("Reaction added")))
}

/// POST /message/reaction/remove
pub async fn remove_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ReactionRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .message_service
        .react(
            auth.context(),
            &req.message_id,
            &req.emoji,
            ReactionAction::Remove,
        )
        .await?;
    Ok(Json(StatusResponse::new("Reaction removed")))
}

/// POST /message/delete
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<DeleteMessageRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .message_service
        .delete(auth.context(), &req.message_id)
        .await?;
    Ok(Json(StatusResponse::new("Message deleted")))
}
