//! User repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use chatrelay_core::error::{AppError, ErrorKind};
use chatrelay_core::result::AppResult;
use chatrelay_core::traits::UserStore;
use chatrelay_core::types::{NewUser, User, UserId};

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

/// Repository for registered users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// Check-then-insert inside one transaction.
    ///
    /// Every early return drops `tx` uncommitted, which rolls it back; the
    /// only commit is on the success path at the end.
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users \
             WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($2))",
        )
        .bind(&user.username)
        .bind(&user.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to check existing user"))?;

        if taken {
            debug!(username = %user.username, "Registration rejected, user exists");
            return Err(AppError::conflict("Username or email already exists"));
        }

        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username, email, password_hash, created_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // A concurrent registration can slip past the existence check.
            if e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::conflict("Username or email already exists")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to insert user", e)
            }
        })?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit user creation"))?;

        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, created_at FROM users \
             WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(User::from))
        .map_err(db_error("Failed to find user by email"))
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(User::from))
        .map_err(db_error("Failed to find user by id"))
    }
}
