//! Database migration command.
//!
//! Migrations are embedded at compile time from `crates/api/migrations/`
//! and applied in order; already-applied migrations are skipped.

use super::{CliError, connect};

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
