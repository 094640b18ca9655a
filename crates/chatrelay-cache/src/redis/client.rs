//! Redis connection management.

use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use chatrelay_core::config::presence::PresenceConfig;
use chatrelay_core::error::{AppError, ErrorKind};
use chatrelay_core::result::AppResult;

/// Redis client wrapper holding a reconnecting connection manager.
#[derive(Debug, Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
    /// Prepended to every key.
    key_prefix: String,
}

impl RedisClient {
    /// Connect using `presence.redis_url`.
    pub async fn connect(config: &PresenceConfig) -> AppResult<Self> {
        info!(url = %mask_redis_url(&config.redis_url), "Connecting to Redis");

        let client = Client::open(config.redis_url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to create Redis client", e)
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to connect to Redis", e)
        })?;

        info!("Connected to Redis");
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// A clone of the connection manager; clones share one connection.
    pub fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Build a full key with the configured prefix.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }
}

/// Mask the password in a Redis URL for logging.
fn mask_redis_url(url: &str) -> String {
    let Some(at_pos) = url.rfind('@') else {
        return url.to_string();
    };
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    if at_pos <= scheme_end {
        return url.to_string();
    }
    match url[scheme_end..at_pos].rfind(':') {
        Some(rel) => format!("{}:****{}", &url[..scheme_end + rel], &url[at_pos..]),
        None => format!("{}****{}", &url[..scheme_end], &url[at_pos..]),
    }
}
