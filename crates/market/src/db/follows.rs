//! Buyers following sellers.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mayombe_core::UserId;

use super::RepositoryError;
use crate::models::SellerSummary;

#[derive(sqlx::FromRow)]
struct FollowedSellerRow {
    id: UserId,
    full_name: String,
    city: Option<String>,
    followed_at: DateTime<Utc>,
}

impl From<FollowedSellerRow> for SellerSummary {
    fn from(r: FollowedSellerRow) -> Self {
        Self {
            id: r.id,
            full_name: r.full_name,
            city: r.city,
            followed_at: r.followed_at,
        }
    }
}

/// Repository for seller follow operations.
pub struct FollowRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FollowRepository<'a> {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Follow a seller. Following twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, including the
    /// self-follow check constraint.
    pub async fn follow(&self, follower: UserId, seller: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO market.seller_follow (follower_id, seller_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, seller_id) DO NOTHING
            ",
        )
        .bind(follower)
        .bind(seller)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Stop following a seller. Returns whether a follow existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn unfollow(&self, follower: UserId, seller: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM market.seller_follow WHERE follower_id = $1 AND seller_id = $2",
        )
        .bind(follower)
        .bind(seller)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sellers followed by `follower`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn followed_by(&self, follower: UserId) -> Result<Vec<SellerSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, FollowedSellerRow>(
            r"
            SELECT p.id, p.full_name, p.city, f.created_at AS followed_at
            FROM market.seller_follow f
            JOIN market.profile p ON p.id = f.seller_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            ",
        )
        .bind(follower)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(SellerSummary::from).collect())
    }

    /// Number of followers of a seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn follower_count(&self, seller: UserId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM market.seller_follow WHERE seller_id = $1")
                .bind(seller)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
