//! Database operations for the market `PostgreSQL` schema.
//!
//! ## Tables (`market` schema)
//!
//! - `profile`, `profile_password` - Accounts and argon2 hashes
//! - `product` - Vendor listings
//! - `cart_item` - Server-side carts
//! - `order` - Orders with denormalized JSONB line items
//! - `negotiation` - Price offers
//! - `favorite`, `seller_follow`, `rating` - Social features
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/market/migrations/` and run via:
//! ```bash
//! cargo run -p mayombe-cli -- migrate
//! ```
//!
//! Queries are built at runtime (`sqlx::query_as` with `FromRow` row types) so
//! the workspace builds without a live database.

pub mod cart;
pub mod favorites;
pub mod follows;
pub mod negotiations;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod ratings;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use favorites::FavoriteRepository;
pub use follows::FollowRepository;
pub use negotiations::NegotiationRepository;
pub use orders::{CheckoutError, OrderRepository};
pub use products::ProductRepository;
pub use profiles::ProfileRepository;
pub use ratings::RatingRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(message: &str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(message.to_owned());
        }
        RepositoryError::Database(e)
    }
}

/// Convert a stored `INTEGER` quantity to the domain's `u32`.
pub(crate) fn quantity_from_db(value: i32) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative quantity {value}")))
}

/// Convert a domain quantity to the stored `INTEGER`.
pub(crate) fn quantity_to_db(value: u32) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("quantity {value} out of range")))
}
