//! Request context carrying the authenticated user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chatrelay_auth::jwt::Claims;
use chatrelay_core::types::UserId;

/// Context for the current authenticated request.
///
/// Built from verified token claims by the API layer and passed into
/// service methods so that every operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// The username (convenience field from JWT claims).
    pub username: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            request_time: Utc::now(),
        }
    }
}

impl From<Claims> for RequestContext {
    fn from(claims: Claims) -> Self {
        Self::new(claims.user_id, claims.username)
    }
}
