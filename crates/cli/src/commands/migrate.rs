//! Database migration command.
//!
//! Migrations live in `crates/market/migrations/` and create the `market`
//! schema and the `tower_sessions` session table.

use super::{CommandError, connect};

/// Run all pending market migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running market migrations...");
    sqlx::migrate!("../market/migrations").run(&pool).await?;

    tracing::info!("Market migrations complete!");
    Ok(())
}
