//! JSON encoding and decoding of socket frames.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use chatrelay_core::error::AppError;
use chatrelay_core::result::AppResult;

use super::envelope::Envelope;

/// Why an inbound frame was not turned into an envelope.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame of {len} bytes exceeds limit of {max}")]
    TooLarge { len: usize, max: usize },
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode one text frame, rejecting frames over `max_bytes`.
pub fn decode_envelope(text: &str, max_bytes: usize) -> Result<Envelope, FrameError> {
    if text.len() > max_bytes {
        return Err(FrameError::TooLarge {
            len: text.len(),
            max: max_bytes,
        });
    }
    Ok(serde_json::from_str(text)?)
}

/// Encode a frame into the shared payload form queued on connections.
pub fn encode_frame<T: Serialize>(frame: &T) -> AppResult<Arc<str>> {
    serde_json::to_string(frame)
        .map(Arc::from)
        .map_err(AppError::from)
}
