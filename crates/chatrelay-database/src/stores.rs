//! Store bundle that dispatches to the configured database provider.

use std::sync::Arc;

use tracing::info;

use chatrelay_core::config::database::DatabaseConfig;
use chatrelay_core::error::AppError;
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::{MessageStore, UserStore};

use crate::connection::DatabasePool;
use crate::memory::{MemoryMessageStore, MemoryUserStore};
use crate::migration::run_migrations;
use crate::repositories::{PgMessageStore, UserRepository};

/// The message and user stores selected by `database.provider`.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Durable message store.
    pub messages: Arc<dyn MessageStore>,
    /// Registered users.
    pub users: Arc<dyn UserStore>,
    /// Pool kept for shutdown; `None` for the memory provider.
    pub pool: Option<DatabasePool>,
}

impl Stores {
    /// Build the stores for `config.provider` (`"postgres"` or `"memory"`).
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "postgres" => {
                info!("Initializing PostgreSQL stores");
                let db = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(db.pool()).await?;
                }
                Ok(Self {
                    messages: Arc::new(PgMessageStore::new(db.pool().clone())),
                    users: Arc::new(UserRepository::new(db.pool().clone())),
                    pool: Some(db),
                })
            }
            "memory" => {
                info!("Initializing in-memory stores");
                Ok(Self::in_memory())
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Supported: postgres, memory"
            ))),
        }
    }

    /// Fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            messages: Arc::new(MemoryMessageStore::new()),
            users: Arc::new(MemoryUserStore::new()),
            pool: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chatrelay_core::error::ErrorKind;

    use super::*;

    #[tokio::test]
    async fn test_unknown_provider_is_configuration_error() {
        let config = DatabaseConfig {
            provider: "mongo".to_string(),
            ..Default::default()
        };
        let err = Stores::from_config(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_memory_provider_has_no_pool() {
        let config = DatabaseConfig {
            provider: "memory".to_string(),
            ..Default::default()
        };
        let stores = Stores::from_config(&config).await.unwrap();
        assert!(stores.pool.is_none());
        assert!(stores.messages.health_check().await.unwrap());
    }
}
