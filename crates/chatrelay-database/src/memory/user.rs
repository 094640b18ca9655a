//! In-memory user store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use chatrelay_core::error::AppError;
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::UserStore;
use chatrelay_core::types::{NewUser, User, UserId};

#[derive(Debug, Default)]
struct Users {
    by_id: BTreeMap<UserId, User>,
    next_id: UserId,
}

/// [`UserStore`] kept in process memory.
///
/// The write lock spans the existence check and the insert, giving the same
/// all-or-nothing behaviour as the transactional PostgreSQL repository.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Users>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;

        let taken = users.by_id.values().any(|u| {
            u.username.eq_ignore_ascii_case(&user.username)
                || u.email.eq_ignore_ascii_case(&user.email)
        });
        if taken {
            return Err(AppError::conflict("Username or email already exists"));
        }

        users.next_id += 1;
        let created = User {
            id: users.next_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.by_id.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .by_id
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.by_id.get(&id).cloned())
    }
}
