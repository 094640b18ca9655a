//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{HealthResponse, MessageResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /ping
pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "pong".to_string(),
    })
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let snapshot = state.engine.snapshot().await?;
    let metrics = state.engine.metrics().snapshot();

    let stores_ok = state.messages.health_check().await.unwrap_or(false)
        && state.presence.health_check().await.unwrap_or(false);

    Ok(Json(HealthResponse {
        status: if stores_ok { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connections: snapshot.connections,
        rooms: snapshot.room_count(),
        messages_relayed: metrics.envelopes_published,
        evictions: metrics.evictions,
    }))
}
