//! Rating repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mayombe_core::rating::{RatingSummary, Stars};
use mayombe_core::{ProductId, RatingId, UserId};

use super::RepositoryError;
use super::orders::product_filter;
use crate::models::Rating;

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: RatingId,
    product_id: ProductId,
    buyer_id: UserId,
    buyer_name: String,
    stars: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(r: RatingRow) -> Result<Self, Self::Error> {
        let stars = u8::try_from(r.stars)
            .ok()
            .and_then(|s| Stars::new(s).ok())
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("invalid stars {} in rating {}", r.stars, r.id))
            })?;

        Ok(Self {
            id: r.id,
            product_id: r.product_id,
            buyer_id: r.buyer_id,
            buyer_name: r.buyer_name,
            stars,
            comment: r.comment,
            created_at: r.created_at,
        })
    }
}

/// Repository for rating database operations.
pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether `buyer_id` has a delivered order containing `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_delivered_purchase(
        &self,
        buyer_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM market."order"
                WHERE buyer_id = $1 AND status = 'delivered' AND items @> $2
            )
            "#,
        )
        .bind(buyer_id)
        .bind(product_filter(product_id))
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Create or replace the buyer's rating of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        buyer_id: UserId,
        product_id: ProductId,
        stars: Stars,
        comment: Option<&str>,
    ) -> Result<Rating, RepositoryError> {
        sqlx::query_as::<_, RatingRow>(
            r"
            WITH saved AS (
                INSERT INTO market.rating (buyer_id, product_id, stars, comment)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (buyer_id, product_id)
                DO UPDATE SET stars = EXCLUDED.stars,
                              comment = EXCLUDED.comment,
                              created_at = NOW()
                RETURNING id, product_id, buyer_id, stars, comment, created_at
            )
            SELECT s.id, s.product_id, s.buyer_id, p.full_name AS buyer_name,
                   s.stars, s.comment, s.created_at
            FROM saved s
            JOIN market.profile p ON p.id = s.buyer_id
            ",
        )
        .bind(buyer_id)
        .bind(product_id)
        .bind(i16::from(stars.get()))
        .bind(comment)
        .fetch_one(self.pool)
        .await?
        .try_into()
    }

    /// Ratings of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<Rating>, RepositoryError> {
        sqlx::query_as::<_, RatingRow>(
            r"
            SELECT r.id, r.product_id, r.buyer_id, p.full_name AS buyer_name,
                   r.stars, r.comment, r.created_at
            FROM market.rating r
            JOIN market.profile p ON p.id = r.buyer_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Rating::try_from)
        .collect()
    }

    /// Average and count of a product's ratings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, product_id: ProductId) -> Result<RatingSummary, RepositoryError> {
        let (star_total, count): (i64, i64) = sqlx::query_as(
            r"
            SELECT COALESCE(SUM(stars), 0)::BIGINT, COUNT(*)
            FROM market.rating
            WHERE product_id = $1
            ",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(RatingSummary::from_totals(star_total, count))
    }
}
