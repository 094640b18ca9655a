//! Handshake authentication for socket upgrades.

use std::sync::Arc;

use chatrelay_auth::jwt::JwtDecoder;
use chatrelay_core::error::AppError;
use chatrelay_core::types::UserId;

/// Identity and target room established before the upgrade completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub user_id: UserId,
    pub username: String,
    pub room_id: String,
}

/// Validates the `room` and `token` connection parameters.
#[derive(Clone)]
pub struct WsAuthenticator {
    decoder: Arc<JwtDecoder>,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    /// Creates a new socket authenticator.
    pub fn new(decoder: Arc<JwtDecoder>) -> Self {
        Self { decoder }
    }

    /// Missing parameters are a validation error, a bad token an
    /// authentication error. Either way the upgrade must be refused.
    pub fn authenticate(
        &self,
        room: Option<&str>,
        token: Option<&str>,
    ) -> Result<Handshake, AppError> {
        let room = room.map(str::trim).filter(|r| !r.is_empty());
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let (Some(room), Some(token)) = (room, token) else {
            return Err(AppError::validation("Missing room or token"));
        };

        let claims = self.decoder.decode(token)?;
        Ok(Handshake {
            user_id: claims.user_id,
            username: claims.username,
            room_id: room.to_string(),
        })
    }
}
