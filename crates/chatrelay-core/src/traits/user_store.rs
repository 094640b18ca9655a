//! User account store contract.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{NewUser, User, UserId};

/// Storage for registered users.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create a user.
    ///
    /// The existence check and the insert happen atomically; a taken
    /// username or email yields a conflict error and nothing is written.
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Look up a user by email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Look up a user by id.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;
}
