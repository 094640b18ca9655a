//! Redis presence store implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use tracing::debug;

use chatrelay_core::error::{AppError, ErrorKind};
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::PresenceStore;
use chatrelay_core::types::UserId;

use super::client::RedisClient;
use crate::keys;

/// Redis-backed presence store.
///
/// Online writes go through an atomic pipeline so the marker and the room
/// set never disagree about a single join or leave.
#[derive(Debug, Clone)]
pub struct RedisPresenceStore {
    client: RedisClient,
    online_ttl: Duration,
}

impl RedisPresenceStore {
    /// Create a new Redis presence store.
    pub fn new(client: RedisClient, online_ttl_seconds: u64) -> Self {
        Self {
            client,
            online_ttl: Duration::from_secs(online_ttl_seconds),
        }
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl PresenceStore for RedisPresenceStore {
    async fn set_online(&self, user_id: UserId, room_id: &str) -> AppResult<()> {
        let user_key = self.client.prefixed_key(&keys::user_online(user_id));
        let room_key = self.client.prefixed_key(&keys::room_users(room_id));
        let ttl = self.online_ttl.as_secs();
        let mut conn = self.client.conn();

        redis::pipe()
            .atomic()
            .set_ex(&user_key, room_id, ttl)
            .ignore()
            .sadd(&room_key, user_id)
            .ignore()
            .expire(&room_key, ttl as i64)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(Self::map_err)?;

        debug!(user_id, room_id, "Presence set online");
        Ok(())
    }

    async fn set_offline(&self, user_id: UserId, room_id: &str) -> AppResult<()> {
        let user_key = self.client.prefixed_key(&keys::user_online(user_id));
        let room_key = self.client.prefixed_key(&keys::room_users(room_id));
        let seen_key = self.client.prefixed_key(&keys::user_last_seen(user_id));
        let mut conn = self.client.conn();

        redis::pipe()
            .atomic()
            .del(&user_key)
            .ignore()
            .srem(&room_key, user_id)
            .ignore()
            .set(&seen_key, Utc::now().timestamp())
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(Self::map_err)?;

        debug!(user_id, room_id, "Presence set offline");
        Ok(())
    }

    async fn is_online(&self, user_id: UserId) -> AppResult<bool> {
        let key = self.client.prefixed_key(&keys::user_online(user_id));
        let mut conn = self.client.conn();
        conn.exists(&key).await.map_err(Self::map_err)
    }

    async fn list_online(&self, room_id: &str) -> AppResult<Vec<UserId>> {
        let key = self.client.prefixed_key(&keys::room_users(room_id));
        let mut conn = self.client.conn();
        let mut users: Vec<UserId> = conn.smembers(&key).await.map_err(Self::map_err)?;
        users.sort_unstable();
        Ok(users)
    }

    async fn last_seen(&self, user_id: UserId) -> AppResult<Option<i64>> {
        let key = self.client.prefixed_key(&keys::user_last_seen(user_id));
        let mut conn = self.client.conn();
        conn.get(&key).await.map_err(Self::map_err)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
