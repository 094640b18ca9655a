//! Convenience result type alias for ChatRelay.

use crate::error::AppError;

/// A specialized `Result` type for ChatRelay operations.
pub type AppResult<T> = Result<T, AppError>;
