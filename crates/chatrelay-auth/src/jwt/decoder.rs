//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use chatrelay_core::config::auth::AuthConfig;
use chatrelay_core::error::AppError;

use super::claims::Claims;

/// Verifies HS256 tokens and extracts the caller's identity.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // seconds of clock skew
        validation.required_spec_claims = ["exp".to_string()].into_iter().collect();

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Check signature and expiry and return the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = %e, "Token rejected");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                }
                _ => AppError::authentication(format!("Invalid token: {e}")),
            }
        })?;

        Ok(data.claims)
    }
}
