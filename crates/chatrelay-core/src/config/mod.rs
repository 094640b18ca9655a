//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so an empty file is a
//! valid configuration.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod presence;
pub mod realtime;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::presence::PresenceConfig;
pub use self::realtime::RealtimeConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Message and user store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Presence store settings.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Hub and connection pump settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `CHATRELAY__`
    /// (e.g. `CHATRELAY__SERVER__PORT=9000`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CHATRELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
