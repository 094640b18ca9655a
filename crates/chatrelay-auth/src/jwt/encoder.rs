//! JWT token creation.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use chatrelay_core::config::auth::AuthConfig;
use chatrelay_core::error::AppError;
use chatrelay_core::types::UserId;

use super::claims::Claims;

/// Signs HS256 login tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl_hours: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_hours: config.token_ttl_hours as i64,
        }
    }

    /// Issue a token for `user_id`, valid for the configured lifetime.
    pub fn issue(&self, user_id: UserId, username: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.ttl_hours)).timestamp(),
        };
        self.encode_claims(&claims)
    }

    /// Sign arbitrary claims.
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }
}
