//! Product catalogue: search, cached detail, vendor listings and ratings.

use tracing::{debug, instrument};

use mayombe_core::rating::{RatingError, clean_comment};
use mayombe_core::{ProductId, Role};

use crate::db::{ProductRepository, RatingRepository};
use crate::error::{AppError, Result};
use crate::models::{
    CurrentUser, NewProduct, NewRating, Product, ProductDetail, ProductQuery, ProductUpdate, Rating,
};
use crate::state::AppState;

/// Catalogue operations backed by the product cache.
pub struct CatalogService<'a> {
    state: &'a AppState,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn products(&self) -> ProductRepository<'a> {
        ProductRepository::new(self.state.pool())
    }

    /// Search active products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        Ok(self.products().search(query).await?)
    }

    /// Product page with its rating summary.
    ///
    /// Inactive products are only shown to their seller and to admins.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist or is hidden
    /// from `viewer`.
    #[instrument(skip(self, viewer), fields(product_id = %id))]
    pub async fn detail(&self, id: ProductId, viewer: Option<&CurrentUser>) -> Result<ProductDetail> {
        let detail = self.cached_detail(id).await?;

        if !detail.product.is_active && !viewer.is_some_and(|u| can_manage(u, &detail.product)) {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(detail)
    }

    async fn cached_detail(&self, id: ProductId) -> Result<ProductDetail> {
        let cache = self.state.product_cache();
        if let Some(detail) = cache.get(&id).await {
            debug!("Cache hit for product");
            return Ok(detail);
        }

        let product = self
            .products()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let rating = RatingRepository::new(self.state.pool()).summary(id).await?;

        let detail = ProductDetail { product, rating };
        cache.insert(id, detail.clone()).await;
        Ok(detail)
    }

    async fn invalidate(&self, id: ProductId) {
        self.state.product_cache().invalidate(&id).await;
    }

    /// List a new product for sale.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` unless the user is a vendor or admin, and
    /// `AppError::BadRequest` for invalid fields.
    #[instrument(skip(self, user, product), fields(user_id = %user.id))]
    pub async fn create(&self, user: &CurrentUser, product: NewProduct) -> Result<Product> {
        if !matches!(user.role, Role::Vendor | Role::Admin) {
            return Err(AppError::Forbidden(
                "Only vendors can list products".to_string(),
            ));
        }
        let product = product.normalized().map_err(AppError::BadRequest)?;

        let created = self.products().create(user.id, &product).await?;
        tracing::info!(product_id = %created.id, "Product listed");
        Ok(created)
    }

    /// Update a product owned by the user (any product for admins).
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound`, `AppError::Forbidden`, or
    /// `AppError::BadRequest` for invalid fields.
    #[instrument(skip(self, user, update), fields(user_id = %user.id, product_id = %id))]
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product> {
        self.owned(user, id).await?;
        let update = update.normalized().map_err(AppError::BadRequest)?;

        let product = self.products().update(id, &update).await?;
        self.invalidate(id).await;
        Ok(product)
    }

    /// Hide a product from the catalogue. Existing orders keep their copy.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Forbidden`.
    #[instrument(skip(self, user), fields(user_id = %user.id, product_id = %id))]
    pub async fn deactivate(&self, user: &CurrentUser, id: ProductId) -> Result<()> {
        self.owned(user, id).await?;
        self.products().deactivate(id).await?;
        self.invalidate(id).await;
        tracing::info!("Product deactivated");
        Ok(())
    }

    /// Load a product the user is allowed to manage.
    async fn owned(&self, user: &CurrentUser, id: ProductId) -> Result<Product> {
        let product = self
            .products()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        if !can_manage(user, &product) {
            return Err(AppError::Forbidden(
                "You can only manage your own products".to_string(),
            ));
        }
        Ok(product)
    }

    /// Ratings of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    pub async fn ratings(&self, id: ProductId) -> Result<Vec<Rating>> {
        self.products()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        Ok(RatingRepository::new(self.state.pool()).list(id).await?)
    }

    /// Rate a product the user received. Rating again replaces the old one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Rating` if the user has no delivered order with the
    /// product or the comment is too long, and `AppError::NotFound` if the
    /// product does not exist.
    #[instrument(skip(self, user, rating), fields(user_id = %user.id, product_id = %id))]
    pub async fn rate(&self, user: &CurrentUser, id: ProductId, rating: &NewRating) -> Result<Rating> {
        self.products()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let ratings = RatingRepository::new(self.state.pool());
        if !ratings.has_delivered_purchase(user.id, id).await? {
            return Err(RatingError::NotPurchased.into());
        }
        let comment = clean_comment(rating.comment.as_deref())?;

        let saved = ratings
            .upsert(user.id, id, rating.stars, comment.as_deref())
            .await?;
        self.invalidate(id).await;
        Ok(saved)
    }
}

/// Sellers manage their own products; admins manage all.
fn can_manage(user: &CurrentUser, product: &Product) -> bool {
    user.is_admin() || product.seller_id == user.id
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use mayombe_core::{Email, Money, UserId};

    use super::*;

    fn user(id: i32, role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: Email::parse("vendeur@mayombe.cg").unwrap(),
            full_name: "Test".to_string(),
            role,
        }
    }

    fn product(seller: i32) -> Product {
        Product {
            id: ProductId::new(1),
            seller_id: UserId::new(seller),
            name: "Pagne".to_string(),
            description: String::new(),
            category: "mode".to_string(),
            price: Money::francs(5_000),
            stock: 3,
            sizes: vec![],
            colors: vec![],
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_can_manage() {
        assert!(can_manage(&user(7, Role::Vendor), &product(7)));
    }

    #[test]
    fn test_other_vendor_cannot_manage() {
        assert!(!can_manage(&user(8, Role::Vendor), &product(7)));
    }

    #[test]
    fn test_admin_can_manage_any() {
        assert!(can_manage(&user(1, Role::Admin), &product(7)));
    }
}
