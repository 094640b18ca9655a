//! # chatrelay-core
//!
//! Core crate for ChatRelay. Contains configuration schemas, typed
//! identifiers, the durable message and user records, the gateway traits
//! consumed by the realtime hub, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ChatRelay crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
