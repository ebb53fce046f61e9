//! Product repository: catalogue search and vendor CRUD.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use mayombe_core::{Money, ProductId, UserId};

use super::{RepositoryError, quantity_to_db};
use crate::models::{NewProduct, Product, ProductQuery, ProductUpdate};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    seller_id: UserId,
    name: String,
    description: String,
    category: String,
    price: Money,
    stock: i32,
    sizes: Vec<String>,
    colors: Vec<String>,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            seller_id: r.seller_id,
            name: r.name,
            description: r.description,
            category: r.category,
            price: r.price,
            stock: r.stock,
            sizes: r.sizes,
            colors: r.colors,
            image_url: r.image_url,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, seller_id, name, description, category, price, stock, \
     sizes, colors, image_url, is_active, created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search active products.
    ///
    /// Every filter is optional; text matches name or description
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = search_query(query);
        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM market.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    /// List a product for `seller_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        seller_id: UserId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO market.product
                (seller_id, name, description, category, price, stock, sizes, colors, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(seller_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(quantity_to_db(product.stock)?)
        .bind(&product.sizes)
        .bind(&product.colors)
        .bind(product.image_url.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let stock = update.stock.map(quantity_to_db).transpose()?;
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE market.product
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                price = COALESCE($5, price),
                stock = COALESCE($6, stock),
                sizes = COALESCE($7, sizes),
                colors = COALESCE($8, colors),
                image_url = COALESCE($9, image_url),
                is_active = COALESCE($10, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.category.as_deref())
        .bind(update.price)
        .bind(stock)
        .bind(update.sizes.as_deref())
        .bind(update.colors.as_deref())
        .bind(update.image_url.as_deref())
        .bind(update.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Hide a product from search and checkout. Existing orders are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn deactivate(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE market.product SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// The subset of `ids` naming products that exist and are active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductId>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let found: Vec<ProductId> = sqlx::query_scalar(
            "SELECT id FROM market.product WHERE id = ANY($1) AND is_active",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(found)
    }

    /// Active products a user has marked as favorite, newest favorite first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn favorites_of(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.seller_id, p.name, p.description, p.category, p.price, p.stock,
                   p.sizes, p.colors, p.image_url, p.is_active, p.created_at, p.updated_at
            FROM market.favorite f
            JOIN market.product p ON p.id = f.product_id
            WHERE f.user_id = $1 AND p.is_active
            ORDER BY f.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}

/// Build the search statement for `query`.
fn search_query(query: &ProductQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {PRODUCT_COLUMNS} FROM market.product WHERE is_active"
    ));

    if let Some(pattern) = query.like_pattern() {
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = query.category() {
        builder.push(" AND category = ").push_bind(category);
    }
    if let Some(min) = query.min_price {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        builder.push(" AND price <= ").push_bind(max);
    }
    if let Some(seller) = query.seller_id {
        builder.push(" AND seller_id = ").push_bind(seller);
    }

    builder
        .push(query.sort.order_by())
        .push(" LIMIT ")
        .push_bind(query.limit())
        .push(" OFFSET ")
        .push_bind(query.offset());

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductSort;

    #[test]
    fn test_search_query_without_filters() {
        let sql = search_query(&ProductQuery::default()).into_sql();
        assert!(sql.contains("WHERE is_active ORDER BY created_at DESC"));
        assert!(sql.ends_with("LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_search_query_with_all_filters() {
        let query = ProductQuery {
            q: Some("wax".to_string()),
            category: Some("Mode".to_string()),
            min_price: Some(Money::francs(1_000)),
            max_price: Some(Money::francs(20_000)),
            seller_id: Some(UserId::new(4)),
            sort: ProductSort::PriceAsc,
            limit: Some(10),
            offset: Some(20),
        };
        let sql = search_query(&query).into_sql();

        assert!(sql.contains("(name ILIKE $1 OR description ILIKE $2)"));
        assert!(sql.contains("AND category = $3"));
        assert!(sql.contains("AND price >= $4"));
        assert!(sql.contains("AND price <= $5"));
        assert!(sql.contains("AND seller_id = $6"));
        assert!(sql.contains("ORDER BY price ASC, id ASC LIMIT $7 OFFSET $8"));
    }
}
