//! Account registration and login.

use std::sync::Arc;

use tracing::{info, warn};

use chatrelay_auth::jwt::JwtEncoder;
use chatrelay_auth::password::PasswordHasher;
use chatrelay_core::error::AppError;
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::UserStore;
use chatrelay_core::types::{NewUser, User};

/// Handles account creation and credential exchange.
#[derive(Debug, Clone)]
pub struct UserService {
    /// User store.
    users: Arc<dyn UserStore>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Token issuer.
    encoder: Arc<JwtEncoder>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<PasswordHasher>,
        encoder: Arc<JwtEncoder>,
    ) -> Self {
        Self {
            users,
            hasher,
            encoder,
        }
    }

    /// Create an account. Duplicate usernames or emails are a conflict.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::validation(
                "Username, email, and password are required",
            ));
        }

        let password_hash = self.hasher.hash_password(password)?;
        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<String> {
        let Some(user) = self.users.find_by_email(email.trim()).await? else {
            warn!("Login failed: unknown email");
            return Err(AppError::authentication("Invalid credentials"));
        };

        if !self.hasher.verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "Login failed: wrong password");
            return Err(AppError::authentication("Invalid credentials"));
        }

        let token = self.encoder.issue(user.id, &user.username)?;
        info!(user_id = user.id, "User logged in");
        Ok(token)
    }
}
