//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chatrelay_auth::jwt::{JwtDecoder, JwtEncoder};
use chatrelay_auth::password::PasswordHasher;
use chatrelay_core::config::AppConfig;
use chatrelay_core::traits::{MessageStore, PresenceStore, UserStore};
use chatrelay_realtime::{RealtimeEngine, WsAuthenticator};
use chatrelay_service::{MessageService, PresenceService, UserService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Gateways ─────────────────────────────────────────────
    /// Durable message store
    pub messages: Arc<dyn MessageStore>,
    /// Presence store
    pub presence: Arc<dyn PresenceStore>,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Socket handshake authenticator
    pub authenticator: WsAuthenticator,

    // ── Realtime ─────────────────────────────────────────────
    /// Hub, pumps, and engine metrics
    pub engine: RealtimeEngine,

    // ── Services ─────────────────────────────────────────────
    /// Message side channel
    pub message_service: Arc<MessageService>,
    /// Presence queries
    pub presence_service: Arc<PresenceService>,
    /// Registration and login
    pub user_service: Arc<UserService>,
}

impl AppState {
    /// Wire auth, the realtime engine, and the services around the given
    /// stores. Starts the engine's tasks, so it must run inside a runtime.
    pub fn new(
        config: AppConfig,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserStore>,
        presence: Arc<dyn PresenceStore>,
    ) -> Self {
        let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
        let password_hasher = Arc::new(PasswordHasher::new());

        let engine = RealtimeEngine::new(
            config.realtime.clone(),
            Arc::clone(&messages),
            Arc::clone(&presence),
        );

        let message_service = Arc::new(MessageService::new(
            Arc::clone(&messages),
            engine.hub().clone(),
        ));
        let presence_service = Arc::new(PresenceService::new(Arc::clone(&presence)));
        let user_service = Arc::new(UserService::new(users, password_hasher, jwt_encoder));

        Self {
            config: Arc::new(config),
            messages,
            presence,
            authenticator: WsAuthenticator::new(Arc::clone(&jwt_decoder)),
            jwt_decoder,
            engine,
            message_service,
            presence_service,
            user_service,
        }
    }
}
