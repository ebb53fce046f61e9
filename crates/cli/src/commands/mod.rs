//! CLI subcommands.

pub mod migrate;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect to the market database named by `MARKET_DATABASE_URL`, falling back
/// to `DATABASE_URL`.
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("MARKET_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("MARKET_DATABASE_URL"))?;

    tracing::info!("Connecting to market database...");
    Ok(mayombe_market::db::create_pool(&SecretString::from(database_url)).await?)
}

/// Errors shared by the subcommands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid role: {0}. Valid roles: buyer, vendor, logistician, admin")]
    InvalidRole(String),

    #[error("No account with email: {0}")]
    UnknownUser(String),

    #[error(transparent)]
    Auth(#[from] mayombe_market::services::AuthError),

    #[error(transparent)]
    Repository(#[from] mayombe_market::db::RepositoryError),
}
