//! Negotiation repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mayombe_core::{Money, NegotiationId, NegotiationStatus, OrderId, ProductId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Negotiation;

#[derive(sqlx::FromRow)]
struct NegotiationRow {
    id: NegotiationId,
    product_id: ProductId,
    buyer_id: UserId,
    seller_id: UserId,
    initial_price: Money,
    proposed_price: Money,
    status: NegotiationStatus,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    used_order_id: Option<OrderId>,
}

impl From<NegotiationRow> for Negotiation {
    fn from(r: NegotiationRow) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            buyer_id: r.buyer_id,
            seller_id: r.seller_id,
            initial_price: r.initial_price,
            proposed_price: r.proposed_price,
            status: r.status,
            created_at: r.created_at,
            responded_at: r.responded_at,
            used_order_id: r.used_order_id,
        }
    }
}

/// Message used when the one-pending-offer index rejects an insert.
pub const ALREADY_PENDING: &str = "an offer on this product is already pending";

/// Repository for negotiation database operations.
pub struct NegotiationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NegotiationRepository<'a> {
    /// Create a new negotiation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a pending offer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the buyer already has a pending
    /// offer on the product.
    pub async fn create(
        &self,
        product_id: ProductId,
        buyer_id: UserId,
        seller_id: UserId,
        initial_price: Money,
        proposed_price: Money,
    ) -> Result<Negotiation, RepositoryError> {
        let row = sqlx::query_as::<_, NegotiationRow>(
            r"
            INSERT INTO market.negotiation
                (product_id, buyer_id, seller_id, initial_price, proposed_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, buyer_id, seller_id, initial_price, proposed_price,
                      status, created_at, responded_at, used_order_id
            ",
        )
        .bind(product_id)
        .bind(buyer_id)
        .bind(seller_id)
        .bind(initial_price)
        .bind(proposed_price)
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique(ALREADY_PENDING))?;
        Ok(row.into())
    }

    /// Get a negotiation by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: NegotiationId) -> Result<Option<Negotiation>, RepositoryError> {
        let row = sqlx::query_as::<_, NegotiationRow>(
            r"
            SELECT id, product_id, buyer_id, seller_id, initial_price, proposed_price,
                   status, created_at, responded_at, used_order_id
            FROM market.negotiation
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Negotiation::from))
    }

    /// Offers made by a buyer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Negotiation>, RepositoryError> {
        let rows = sqlx::query_as::<_, NegotiationRow>(
            r"
            SELECT id, product_id, buyer_id, seller_id, initial_price, proposed_price,
                   status, created_at, responded_at, used_order_id
            FROM market.negotiation
            WHERE buyer_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(buyer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Negotiation::from).collect())
    }

    /// Offers received by a seller, pending ones first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<Negotiation>, RepositoryError> {
        let rows = sqlx::query_as::<_, NegotiationRow>(
            r"
            SELECT id, product_id, buyer_id, seller_id, initial_price, proposed_price,
                   status, created_at, responded_at, used_order_id
            FROM market.negotiation
            WHERE seller_id = $1
            ORDER BY status = 'pending' DESC, created_at DESC, id DESC
            ",
        )
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Negotiation::from).collect())
    }

    /// Answer a pending offer.
    ///
    /// The update only matches while the offer is still `pending`; `Ok(None)`
    /// means someone else answered it first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn respond(
        &self,
        id: NegotiationId,
        outcome: NegotiationStatus,
    ) -> Result<Option<Negotiation>, RepositoryError> {
        let row = sqlx::query_as::<_, NegotiationRow>(
            r"
            UPDATE market.negotiation
            SET status = $2, responded_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, product_id, buyer_id, seller_id, initial_price, proposed_price,
                      status, created_at, responded_at, used_order_id
            ",
        )
        .bind(id)
        .bind(outcome)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Negotiation::from))
    }
}
