//! Account handlers: register and login.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{TokenResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .user_service
        .register(&req.username, &req.email, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.user_service.login(&req.email, &req.password).await?;
    Ok(Json(TokenResponse { token }))
}
