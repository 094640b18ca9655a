//! # chatrelay-api
//!
//! HTTP API layer for ChatRelay built on Axum.
//!
//! Provides the WebSocket upgrade, the REST side channel (messages,
//! reactions, deletion, presence, accounts), middleware (CORS, request
//! logging), extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
