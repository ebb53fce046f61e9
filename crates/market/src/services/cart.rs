//! Server-side cart and guest cart reconciliation.

use std::collections::HashSet;

use sqlx::PgPool;
use tracing::instrument;

use mayombe_core::cart::{CartLine, validate_quantity};
use mayombe_core::{CartItemId, ProductId, UserId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{AddToCart, CartItem};

/// Cart operations for one signed-in user at a time.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>> {
        Ok(CartRepository::new(self.pool).list(user_id).await?)
    }

    /// Add a product to the cart, summing with an existing line for the same
    /// variant.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cart` for a bad quantity, `AppError::NotFound` if
    /// the product is missing or inactive, and `AppError::BadRequest` if the
    /// product has no such size or color.
    #[instrument(skip(self, request), fields(user_id = %user_id, product_id = %request.product_id))]
    pub async fn add(&self, user_id: UserId, request: &AddToCart) -> Result<CartItem> {
        let line = CartLine::new(
            request.product_id,
            request.quantity,
            request.size.as_deref(),
            request.color.as_deref(),
        )?;

        let product = ProductRepository::new(self.pool)
            .get(line.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if !product.offers_variant(line.size.as_deref(), line.color.as_deref()) {
            return Err(AppError::BadRequest(
                "This product is not available in the selected size or color".to_string(),
            ));
        }

        Ok(CartRepository::new(self.pool).add(user_id, &line).await?)
    }

    /// Set the quantity of one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cart` for a bad quantity and `AppError::Database`
    /// (not found) if the line is not in the user's cart.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartItem> {
        validate_quantity(quantity)?;
        Ok(CartRepository::new(self.pool)
            .set_quantity(user_id, item_id, quantity)
            .await?)
    }

    /// Remove one line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` (not found) if the line is not in the cart.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<()> {
        Ok(CartRepository::new(self.pool).remove(user_id, item_id).await?)
    }

    /// Empty the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<()> {
        Ok(CartRepository::new(self.pool).clear(user_id).await?)
    }

    /// Merge a guest cart into the server cart and persist the result.
    ///
    /// Guest lines naming missing or inactive products are dropped. Reading,
    /// merging and replacing the stored cart happen in one locked transaction.
    /// Replaying the same guest cart adds its quantities again.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if reading or replacing the cart fails.
    #[instrument(skip(self, local), fields(user_id = %user_id, local_lines = local.len()))]
    pub async fn sync(&self, user_id: UserId, local: &[CartLine]) -> Result<Vec<CartItem>> {
        let local = self.known_lines(local).await?;
        let items = CartRepository::new(self.pool)
            .merge_guest(user_id, &local)
            .await?;
        tracing::info!(items = items.len(), "Guest cart merged");
        Ok(items)
    }

    /// Keep only guest lines for products that exist and are active.
    async fn known_lines(&self, local: &[CartLine]) -> Result<Vec<CartLine>> {
        let ids: Vec<ProductId> = local
            .iter()
            .map(|l| l.product_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let active: HashSet<ProductId> = ProductRepository::new(self.pool)
            .active_ids(&ids)
            .await?
            .into_iter()
            .collect();

        Ok(retain_known(local, &active))
    }
}

fn retain_known(local: &[CartLine], active: &HashSet<ProductId>) -> Vec<CartLine> {
    local
        .iter()
        .filter(|line| active.contains(&line.product_id))
        .cloned()
        .collect()
}
