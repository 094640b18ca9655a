//! Embedded schema migrations (`migrations/` at the workspace root).

use sqlx::PgPool;
use tracing::info;

use chatrelay_core::error::{AppError, ErrorKind};
use chatrelay_core::result::AppResult;

/// Apply every pending migration. Already-applied ones are skipped.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    info!("Running database migrations");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Database migrations completed");
    Ok(())
}
