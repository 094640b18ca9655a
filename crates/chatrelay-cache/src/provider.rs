//! Presence manager that dispatches to the configured provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use chatrelay_core::config::presence::PresenceConfig;
use chatrelay_core::error::AppError;
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::PresenceStore;
use chatrelay_core::types::UserId;

/// Presence manager that wraps the configured presence store.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct PresenceManager {
    inner: Arc<dyn PresenceStore>,
}

impl PresenceManager {
    /// Create a new presence manager from configuration.
    pub async fn new(config: &PresenceConfig) -> AppResult<Self> {
        let inner: Arc<dyn PresenceStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis presence store");
                let client = crate::redis::RedisClient::connect(config).await?;
                Arc::new(crate::redis::RedisPresenceStore::new(
                    client,
                    config.online_ttl_seconds,
                ))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory presence store");
                Arc::new(crate::memory::MemoryPresenceStore::new(config))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown presence provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Wrap an existing store (used by tests).
    pub fn from_store(store: Arc<dyn PresenceStore>) -> Self {
        Self { inner: store }
    }
}

#[async_trait]
impl PresenceStore for PresenceManager {
    async fn set_online(&self, user_id: UserId, room_id: &str) -> AppResult<()> {
        self.inner.set_online(user_id, room_id).await
    }

    async fn set_offline(&self, user_id: UserId, room_id: &str) -> AppResult<()> {
        self.inner.set_offline(user_id, room_id).await
    }

    async fn is_online(&self, user_id: UserId) -> AppResult<bool> {
        self.inner.is_online(user_id).await
    }

    async fn list_online(&self, room_id: &str) -> AppResult<Vec<UserId>> {
        self.inner.list_online(room_id).await
    }

    async fn last_seen(&self, user_id: UserId) -> AppResult<Option<i64>> {
        self.inner.last_seen(user_id).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
