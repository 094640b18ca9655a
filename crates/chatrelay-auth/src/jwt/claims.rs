//! JWT claims carried by login tokens.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use chatrelay_core::types::UserId;

/// Claims payload: `{user_id, username, iat, exp}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user.
    pub user_id: UserId,
    /// Display name at issue time.
    pub username: String,
    /// Issued-at (seconds since epoch).
    #[serde(default)]
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Whether `exp` has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
