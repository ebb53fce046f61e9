//! Cart repository.
//!
//! One row per (user, product, size, color); NULL variants compare equal via
//! the `cart_item_key_idx` expression index.
//!
//! Every write holds the owner's profile row `FOR UPDATE` for its whole
//! transaction, so a guest merge or checkout never overwrites a line changed
//! after it read the cart.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use mayombe_core::cart::{CartLine, MAX_LINE_QUANTITY, merge};
use mayombe_core::{CartItemId, ProductId, UserId};

use super::{RepositoryError, quantity_from_db, quantity_to_db};
use crate::models::CartItem;

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    product_id: ProductId,
    quantity: i32,
    size: Option<String>,
    color: Option<String>,
    added_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(r: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            product_id: r.product_id,
            quantity: quantity_from_db(r.quantity)?,
            size: r.size,
            color: r.color,
            added_at: r.added_at,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lines of a user's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        list_in(&mut conn, user_id).await
    }

    /// Add a line, summing with an existing line for the same product and
    /// variant. The stored quantity is capped at [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add(&self, user_id: UserId, line: &CartLine) -> Result<CartItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, user_id).await?;

        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO market.cart_item (user_id, product_id, quantity, size, color)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id, (COALESCE(size, '')), (COALESCE(color, '')))
            DO UPDATE SET quantity = LEAST(market.cart_item.quantity + EXCLUDED.quantity, $6)
            RETURNING id, product_id, quantity, size, color, added_at
            ",
        )
        .bind(user_id)
        .bind(line.product_id)
        .bind(quantity_to_db(line.quantity.min(MAX_LINE_QUANTITY))?)
        .bind(line.size.as_deref())
        .bind(line.color.as_deref())
        .bind(quantity_to_db(MAX_LINE_QUANTITY)?)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Set the quantity of one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in the user's cart.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, user_id).await?;

        let item: CartItem = sqlx::query_as::<_, CartItemRow>(
            r"
            UPDATE market.cart_item
            SET quantity = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, product_id, quantity, size, color, added_at
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity_to_db(quantity)?)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()?;

        tx.commit().await?;
        Ok(item)
    }

    /// Remove one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in the user's cart.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, user_id).await?;

        let result = sqlx::query("DELETE FROM market.cart_item WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, user_id).await?;
        clear_in(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Merge guest lines into the stored cart in one transaction.
    ///
    /// The cart is locked before it is read, so a line added concurrently is
    /// either merged or waits for this transaction; it is never overwritten.
    /// The merged cart then replaces the stored one, with quantities capped at
    /// [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// changed in that case.
    pub async fn merge_guest(
        &self,
        user_id: UserId,
        local: &[CartLine],
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, user_id).await?;

        let server: Vec<CartLine> = list_in(&mut tx, user_id)
            .await?
            .iter()
            .map(CartItem::line)
            .collect();
        let merged = merge(local, &server);

        clear_in(&mut tx, user_id).await?;
        for line in &merged {
            sqlx::query(
                r"
                INSERT INTO market.cart_item (user_id, product_id, quantity, size, color)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(user_id)
            .bind(line.product_id)
            .bind(quantity_to_db(line.quantity.min(MAX_LINE_QUANTITY))?)
            .bind(line.size.as_deref())
            .bind(line.color.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        let items = list_in(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(items)
    }
}

/// Serialize cart changes for one user until the transaction ends.
pub(crate) async fn lock_cart(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT 1 FROM market.profile WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// List a cart on an existing connection or transaction.
pub(crate) async fn list_in(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<CartItem>, RepositoryError> {
    sqlx::query_as::<_, CartItemRow>(
        r"
        SELECT id, product_id, quantity, size, color, added_at
        FROM market.cart_item
        WHERE user_id = $1
        ORDER BY added_at, id
        ",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?
    .into_iter()
    .map(CartItem::try_from)
    .collect()
}

/// Empty a cart on an existing connection or transaction.
pub(crate) async fn clear_in(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM market.cart_item WHERE user_id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}
