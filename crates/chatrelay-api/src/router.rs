//! Route definitions for the ChatRelay HTTP API.
//!
//! Routes sit at the root, grouped by domain. The router receives
//! `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(message_routes())
        .merge(presence_routes())
        .route("/ws", get(handlers::ws::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Liveness and engine health
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(handlers::health::ping))
        .route("/health", get(handlers::health::health))
}

/// Registration and login
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
}

/// Message side channel
fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/message", post(handlers::message::submit))
        .route("/message/{id}", get(handlers::message::get_message))
        .route("/messages", get(handlers::message::history))
        .route("/message/reaction/add", post(handlers::message::add_reaction))
        .route(
            "/message/reaction/remove",
            post(handlers::message::remove_reaction),
        )
        .route("/message/delete", post(handlers::message::delete))
}

/// Presence queries
fn presence_routes() -> Router<AppState> {
    Router::new()
        .route("/online-users", get(handlers::presence::online_users))
        .route("/user-status", get(handlers::presence::user_status))
}
