//! Presence query handlers.

use axum::Json;
use axum::extract::{Query, State};

use chatrelay_service::UserStatus;

use crate::dto::request::{OnlineUsersQuery, UserStatusQuery};
use crate::dto::response::OnlineUsersResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /online-users?room=
pub async fn online_users(
    State(state): State<AppState>,
    Query(query): Query<OnlineUsersQuery>,
) -> Result<Json<OnlineUsersResponse>, ApiError> {
    let users = state.presence_service.online_users(&query.room).await?;
    Ok(Json(OnlineUsersResponse { users }))
}

/// GET /user-status?user=
pub async fn user_status(
    State(state): State<AppState>,
    Query(query): Query<UserStatusQuery>,
) -> Result<Json<UserStatus>, ApiError> {
    Ok(Json(state.presence_service.user_status(query.user).await?))
}
