//! In-memory presence store using moka TTL caches.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use moka::future::Cache;
use tracing::debug;

use chatrelay_core::config::presence::PresenceConfig;
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::PresenceStore;
use chatrelay_core::types::UserId;

type RoomSet = Arc<DashSet<UserId>>;

/// In-memory presence store with the same expiry rules as the Redis layout.
///
/// Online markers and room sets live in moka caches whose time-to-live is
/// restarted by every write; last-seen times never expire.
#[derive(Debug, Clone)]
pub struct MemoryPresenceStore {
    /// user id -> room id.
    online: Cache<UserId, String>,
    /// room id -> online user ids.
    rooms: Cache<String, RoomSet>,
    /// user id -> unix seconds.
    last_seen: Arc<DashMap<UserId, i64>>,
}

impl MemoryPresenceStore {
    /// Create a store from configuration.
    pub fn new(config: &PresenceConfig) -> Self {
        Self::with_ttl(
            Duration::from_secs(config.online_ttl_seconds),
            config.max_capacity,
        )
    }

    /// Create a store with an explicit online TTL.
    pub fn with_ttl(online_ttl: Duration, max_capacity: u64) -> Self {
        Self {
            online: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(online_ttl)
                .build(),
            rooms: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(online_ttl)
                .build(),
            last_seen: Arc::new(DashMap::new()),
        }
    }
}

impl Default for MemoryPresenceStore {
    fn default() -> Self {
        Self::new(&PresenceConfig::default())
    }
}

#[async_trait]
impl PresenceStore for MemoryPresenceStore {
    async fn set_online(&self, user_id: UserId, room_id: &str) -> AppResult<()> {
        self.online.insert(user_id, room_id.to_string()).await;

        let members = self
            .rooms
            .get_with(room_id.to_string(), async { Arc::new(DashSet::new()) })
            .await;
        members.insert(user_id);
        // Re-inserting restarts the room set's TTL.
        self.rooms.insert(room_id.to_string(), members).await;

        debug!(user_id, room_id, "Presence set online");
        Ok(())
    }

    async fn set_offline(&self, user_id: UserId, room_id: &str) -> AppResult<()> {
        self.online.invalidate(&user_id).await;

        if let Some(members) = self.rooms.get(room_id).await {
            members.remove(&user_id);
            if members.is_empty() {
                self.rooms.invalidate(room_id).await;
            }
        }

        self.last_seen.insert(user_id, Utc::now().timestamp());
        debug!(user_id, room_id, "Presence set offline");
        Ok(())
    }

    async fn is_online(&self, user_id: UserId) -> AppResult<bool> {
        Ok(self.online.get(&user_id).await.is_some())
    }

    async fn list_online(&self, room_id: &str) -> AppResult<Vec<UserId>> {
        let mut users: Vec<UserId> = match self.rooms.get(room_id).await {
            Some(members) => members.iter().map(|u| *u).collect(),
            None => Vec::new(),
        };
        users.sort_unstable();
        Ok(users)
    }

    async fn last_seen(&self, user_id: UserId) -> AppResult<Option<i64>> {
        Ok(self.last_seen.get(&user_id).map(|ts| *ts))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
