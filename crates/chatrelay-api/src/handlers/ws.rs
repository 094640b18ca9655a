//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt, future};
use tracing::{info, warn};

use chatrelay_realtime::{Handshake, TransportFrame};

use crate::dto::request::WsQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /ws?room={room}&token={jwt}
///
/// The token is checked before the upgrade; a missing parameter is a 400
/// and a bad token a 401, and no socket is opened in either case.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let handshake = state
        .authenticator
        .authenticate(query.room.as_deref(), query.token.as_deref())?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(state, handshake, socket)))
}

/// Adapts the socket to the engine's frame types and runs the connection.
async fn handle_socket(state: AppState, handshake: Handshake, socket: WebSocket) {
    let user_id = handshake.user_id;
    let room_id = handshake.room_id.clone();
    info!(user_id, room_id = %room_id, "WebSocket connection established");

    let (ws_tx, ws_rx) = socket.split();

    let sink = ws_tx.with(|payload: Arc<str>| {
        future::ready(Ok::<_, axum::Error>(Message::text(&*payload)))
    });

    let stream = ws_rx.filter_map(|frame| {
        future::ready(match frame {
            Ok(Message::Text(text)) => Some(Ok(TransportFrame::Text(text.as_str().to_owned()))),
            Ok(Message::Close(_)) => Some(Ok(TransportFrame::Close)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
    });

    if let Err(e) = state.engine.connect(handshake, sink, stream).await {
        warn!(user_id, room_id = %room_id, error = %e, "WebSocket connection refused");
        return;
    }

    info!(user_id, room_id = %room_id, "WebSocket connection closed");
}
