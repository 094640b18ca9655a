//! Read-only presence queries.

use std::sync::Arc;

use serde::Serialize;

use chatrelay_core::error::AppError;
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::PresenceStore;
use chatrelay_core::types::UserId;

/// Online state and last-seen time of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatus {
    pub online: bool,
    /// Unix seconds of the last disconnect, `None` if never seen.
    pub last_seen: Option<i64>,
}

/// Answers who is online where.
#[derive(Debug, Clone)]
pub struct PresenceService {
    store: Arc<dyn PresenceStore>,
}

impl PresenceService {
    pub fn new(store: Arc<dyn PresenceStore>) -> Self {
        Self { store }
    }

    /// Users currently online in a room, ascending.
    pub async fn online_users(&self, room_id: &str) -> AppResult<Vec<UserId>> {
        let room_id = room_id.trim();
        if room_id.is_empty() {
            return Err(AppError::validation("room is required"));
        }
        self.store.list_online(room_id).await
    }

    pub async fn user_status(&self, user_id: UserId) -> AppResult<UserStatus> {
        Ok(UserStatus {
            online: self.store.is_online(user_id).await?,
            last_seen: self.store.last_seen(user_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chatrelay_cache::memory::MemoryPresenceStore;

    use super::*;

    #[tokio::test]
    async fn test_status_tracks_online_and_last_seen() {
        let store = Arc::new(MemoryPresenceStore::default());
        let service = PresenceService::new(store.clone());

        assert_eq!(
            service.user_status(5).await.unwrap(),
            UserStatus {
                online: false,
                last_seen: None
            }
        );

        store.set_online(5, "general").await.unwrap();
        store.set_online(3, "general").await.unwrap();
        assert_eq!(service.online_users("general").await.unwrap(), vec![3, 5]);
        assert!(service.user_status(5).await.unwrap().online);

        store.set_offline(5, "general").await.unwrap();
        let status = service.user_status(5).await.unwrap();
        assert!(!status.online);
        assert!(status.last_seen.is_some());
    }

    #[tokio::test]
    async fn test_room_is_required() {
        let service = PresenceService::new(Arc::new(MemoryPresenceStore::default()));
        assert!(service.online_users(" ").await.is_err());
    }
}
