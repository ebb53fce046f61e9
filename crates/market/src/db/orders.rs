//! Order repository: checkout, listing, status writes, payouts.
//!
//! Line items are stored as a JSONB array of [`OrderItem`]. Per-seller and
//! per-product lookups use JSONB containment (`items @> '[{"seller_id": 7}]'`),
//! served by the GIN index on `items`.
//!
//! Every status write is a compare-and-set on the status read by the caller.
//! A write that matches no row returns `Ok(None)` and changes nothing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use mayombe_core::order::{OrderItem, OrderTransition, order_total};
use mayombe_core::payout::loyalty_points;
use mayombe_core::{
    Money, MoneyError, NegotiationId, OrderId, OrderStatus, PaymentMethod, PayoutStatus,
    ProductId, Role, UserId,
};

use super::{RepositoryError, cart, quantity_to_db};
use crate::models::{CartItem, CheckoutRequest, Order};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    buyer_id: UserId,
    items: Json<Vec<OrderItem>>,
    total: Money,
    status: OrderStatus,
    payment_method: PaymentMethod,
    delivery_address: Option<String>,
    delivery_city: Option<String>,
    delivery_phone: Option<String>,
    logistician_id: Option<UserId>,
    confirmed_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    picked_up_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    payout_status: PayoutStatus,
    payout_released_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Self {
            id: r.id,
            buyer_id: r.buyer_id,
            items: r.items.0,
            total: r.total,
            status: r.status,
            payment_method: r.payment_method,
            delivery_address: r.delivery_address,
            delivery_city: r.delivery_city,
            delivery_phone: r.delivery_phone,
            logistician_id: r.logistician_id,
            confirmed_at: r.confirmed_at,
            shipped_at: r.shipped_at,
            picked_up_at: r.picked_up_at,
            delivered_at: r.delivered_at,
            cancelled_at: r.cancelled_at,
            payout_status: r.payout_status,
            payout_released_at: r.payout_released_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, buyer_id, items, total, status, payment_method, \
     delivery_address, delivery_city, delivery_phone, logistician_id, \
     confirmed_at, shipped_at, picked_up_at, delivered_at, cancelled_at, \
     payout_status, payout_released_at, created_at, updated_at";

/// Product fields read under `FOR UPDATE` at checkout.
#[derive(Debug, Clone, sqlx::FromRow)]
struct LockedProduct {
    id: ProductId,
    seller_id: UserId,
    name: String,
    price: Money,
    stock: i32,
    is_active: bool,
}

/// An accepted offer not yet used by any order.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
struct AcceptedOffer {
    id: NegotiationId,
    product_id: ProductId,
    proposed_price: Money,
}

/// Order lines plus the offers that priced them.
#[derive(Debug)]
struct PricedCart {
    items: Vec<OrderItem>,
    offers_used: Vec<NegotiationId>,
}

/// Why a checkout was refused.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A product was removed or deactivated after it was added to the cart.
    #[error("product {0} is no longer available")]
    Unavailable(ProductId),

    /// Not enough stock for the requested quantity.
    #[error("only {available} left in stock for {name}")]
    OutOfStock {
        product_id: ProductId,
        name: String,
        available: u32,
    },

    /// Order total could not be computed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM market."order" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Order::from))
    }

    /// Orders visible to a user given their role, newest first.
    ///
    /// Everyone sees what they bought. Vendors also see orders containing
    /// their products; logisticians also see orders assigned to them and
    /// shipped orders nobody has claimed yet; admins see everything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for(&self, user_id: UserId, role: Role) -> Result<Vec<Order>, RepositoryError> {
        let mut builder = list_query(user_id, role);
        let rows = builder
            .build_query_as::<OrderRow>()
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Non-cancelled orders containing products of `seller_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sold_by(&self, seller_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM market."order"
            WHERE items @> $1 AND status <> 'cancelled'
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(seller_filter(seller_id))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Turn the buyer's cart into a pending order.
    ///
    /// Runs in one transaction: the cart and products are locked,
    /// availability and stock are checked, stock is decremented and the cart
    /// emptied. A line is priced at the buyer's latest unused accepted offer
    /// when it is still below the list price, and that offer is then marked
    /// as used by the new order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] if the cart is empty, a product is gone or
    /// short on stock, or the database fails. Nothing is written on error.
    pub async fn checkout(
        &self,
        buyer_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        cart::lock_cart(&mut tx, buyer_id).await?;
        let cart_items = cart::list_in(&mut tx, buyer_id).await?;
        if cart_items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut product_ids: Vec<i32> = cart_items.iter().map(|i| i.product_id.as_i32()).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let products: HashMap<ProductId, LockedProduct> = sqlx::query_as::<_, LockedProduct>(
            r"
            SELECT id, seller_id, name, price, stock, is_active
            FROM market.product
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

        // Newest first, so the first row seen per product wins.
        let mut offers: HashMap<ProductId, AcceptedOffer> = HashMap::new();
        for offer in sqlx::query_as::<_, AcceptedOffer>(
            r"
            SELECT id, product_id, proposed_price
            FROM market.negotiation
            WHERE buyer_id = $1
              AND product_id = ANY($2)
              AND status = 'accepted'
              AND used_order_id IS NULL
            ORDER BY product_id, responded_at DESC, id DESC
            FOR UPDATE
            ",
        )
        .bind(buyer_id)
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?
        {
            offers.entry(offer.product_id).or_insert(offer);
        }

        let PricedCart { items, offers_used } = price_cart(&cart_items, &products, &offers)?;
        let total = order_total(&items)?;

        for (product_id, quantity) in quantities_by_product(&items) {
            sqlx::query(
                "UPDATE market.product SET stock = stock - $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(product_id)
            .bind(quantity_to_db(quantity)?)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO market."order"
                (buyer_id, items, total, payment_method,
                 delivery_address, delivery_city, delivery_phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(buyer_id)
        .bind(Json(&items))
        .bind(total)
        .bind(request.payment_method)
        .bind(request.delivery_address.as_deref())
        .bind(request.delivery_city.as_deref())
        .bind(request.delivery_phone.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        if !offers_used.is_empty() {
            let ids: Vec<i32> = offers_used.iter().map(|id| id.as_i32()).collect();
            sqlx::query(
                r"
                UPDATE market.negotiation
                SET used_order_id = $1
                WHERE id = ANY($2) AND used_order_id IS NULL
                ",
            )
            .bind(row.id)
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
        }

        cart::clear_in(&mut tx, buyer_id).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    /// Apply a status transition if the order is still in `expected`.
    ///
    /// Sets the transition's timestamp. Delivering also holds the payout and
    /// credits the buyer's loyalty points; cancelling puts the items back in
    /// stock. Returns `Ok(None)` when the status no longer matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn transition(
        &self,
        id: OrderId,
        expected: OrderStatus,
        transition: OrderTransition,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let payout = if transition == OrderTransition::Deliver {
            ", payout_status = 'held'"
        } else {
            ""
        };
        let column = timestamp_column(transition);

        let Some(row) = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE market."order"
            SET status = $3, {column} = NOW(), updated_at = NOW(){payout}
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected)
        .bind(transition.target())
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        let order = Order::from(row);

        match transition {
            OrderTransition::Deliver => credit_loyalty(&mut tx, &order).await?,
            OrderTransition::Cancel => restock(&mut tx, &order.items).await?,
            _ => {}
        }

        tx.commit().await?;
        Ok(Some(order))
    }

    /// Assign a logistician to a confirmed or shipped order.
    ///
    /// Returns `Ok(None)` if the order is in any other status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn assign(
        &self,
        id: OrderId,
        logistician_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE market."order"
            SET logistician_id = $2, updated_at = NOW()
            WHERE id = $1 AND status IN ('confirmed', 'shipped')
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(logistician_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Order::from))
    }

    /// Let a logistician take an unassigned shipped order.
    ///
    /// Returns `Ok(None)` if the order is not shipped or already has a
    /// logistician.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn claim(
        &self,
        id: OrderId,
        logistician_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE market."order"
            SET logistician_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'shipped' AND logistician_id IS NULL
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(logistician_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Order::from))
    }

    /// Move a held payout to released.
    ///
    /// Returns `Ok(None)` if the payout is no longer held.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn release_payout(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE market."order"
            SET payout_status = 'released', payout_released_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND payout_status = 'held'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Order::from))
    }
}

/// JSONB containment filter matching orders with a line from `seller_id`.
pub(crate) fn seller_filter(seller_id: UserId) -> serde_json::Value {
    json!([{ "seller_id": seller_id }])
}

/// JSONB containment filter matching orders with a line for `product_id`.
pub(crate) fn product_filter(product_id: ProductId) -> serde_json::Value {
    json!([{ "product_id": product_id }])
}

const fn timestamp_column(transition: OrderTransition) -> &'static str {
    match transition {
        OrderTransition::Confirm => "confirmed_at",
        OrderTransition::Ship => "shipped_at",
        OrderTransition::PickUp => "picked_up_at",
        OrderTransition::Deliver => "delivered_at",
        OrderTransition::Cancel => "cancelled_at",
    }
}

fn list_query(user_id: UserId, role: Role) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        r#"SELECT {ORDER_COLUMNS} FROM market."order""#
    ));

    match role {
        Role::Admin => {}
        Role::Buyer => {
            builder.push(" WHERE buyer_id = ").push_bind(user_id);
        }
        Role::Vendor => {
            builder
                .push(" WHERE buyer_id = ")
                .push_bind(user_id)
                .push(" OR items @> ")
                .push_bind(seller_filter(user_id));
        }
        Role::Logistician => {
            builder
                .push(" WHERE buyer_id = ")
                .push_bind(user_id)
                .push(" OR logistician_id = ")
                .push_bind(user_id)
                .push(" OR (status = 'shipped' AND logistician_id IS NULL)");
        }
    }

    builder.push(" ORDER BY created_at DESC, id DESC");
    builder
}

/// Build order lines from the cart, checking availability and stock.
///
/// An offer applies only while it is below the current list price; a buyer is
/// never charged more than the list price.
fn price_cart(
    cart_items: &[CartItem],
    products: &HashMap<ProductId, LockedProduct>,
    offers: &HashMap<ProductId, AcceptedOffer>,
) -> Result<PricedCart, CheckoutError> {
    let mut items = Vec::with_capacity(cart_items.len());
    let mut offers_used: Vec<NegotiationId> = Vec::new();

    for line in cart_items {
        let product = products
            .get(&line.product_id)
            .filter(|p| p.is_active)
            .ok_or(CheckoutError::Unavailable(line.product_id))?;

        let offer = offers
            .get(&product.id)
            .filter(|offer| offer.proposed_price < product.price);
        if let Some(offer) = offer.filter(|offer| !offers_used.contains(&offer.id)) {
            offers_used.push(offer.id);
        }

        items.push(OrderItem {
            product_id: product.id,
            seller_id: product.seller_id,
            name: product.name.clone(),
            unit_price: offer.map_or(product.price, |offer| offer.proposed_price),
            quantity: line.quantity,
            size: line.size.clone(),
            color: line.color.clone(),
        });
    }

    // Variants of one product share its stock.
    for (product_id, wanted) in quantities_by_product(&items) {
        if let Some(product) = products.get(&product_id) {
            let available = u32::try_from(product.stock).unwrap_or(0);
            if wanted > available {
                return Err(CheckoutError::OutOfStock {
                    product_id,
                    name: product.name.clone(),
                    available,
                });
            }
        }
    }

    Ok(PricedCart { items, offers_used })
}

/// Total quantity per product, in first-seen order.
fn quantities_by_product(items: &[OrderItem]) -> Vec<(ProductId, u32)> {
    let mut totals: Vec<(ProductId, u32)> = Vec::new();
    for item in items {
        match totals.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(item.quantity),
            None => totals.push((item.product_id, item.quantity)),
        }
    }
    totals
}

async fn credit_loyalty(conn: &mut PgConnection, order: &Order) -> Result<(), RepositoryError> {
    let points = loyalty_points(order.total);
    if points == 0 {
        return Ok(());
    }
    sqlx::query(
        r"
        UPDATE market.profile
        SET loyalty_points = loyalty_points + $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(order.buyer_id)
    .bind(points)
    .execute(conn)
    .await?;
    Ok(())
}

async fn restock(conn: &mut PgConnection, items: &[OrderItem]) -> Result<(), RepositoryError> {
    for (product_id, quantity) in quantities_by_product(items) {
        sqlx::query(
            "UPDATE market.product SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(product_id)
        .bind(quantity_to_db(quantity)?)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use mayombe_core::CartItemId;

    use super::*;

    fn product(id: i32, seller: i32, price: u32, stock: i32) -> LockedProduct {
        LockedProduct {
            id: ProductId::new(id),
            seller_id: UserId::new(seller),
            name: format!("Produit {id}"),
            price: Money::francs(price),
            stock,
            is_active: true,
        }
    }

    fn cart_line(id: i32, product_id: i32, quantity: u32, size: Option<&str>) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(product_id),
            quantity,
            size: size.map(ToOwned::to_owned),
            color: None,
            added_at: Utc::now(),
        }
    }

    fn catalogue(products: Vec<LockedProduct>) -> HashMap<ProductId, LockedProduct> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn offers(list: &[(i32, i32, u32)]) -> HashMap<ProductId, AcceptedOffer> {
        list.iter()
            .map(|&(id, product_id, price)| {
                let offer = AcceptedOffer {
                    id: NegotiationId::new(id),
                    product_id: ProductId::new(product_id),
                    proposed_price: Money::francs(price),
                };
                (offer.product_id, offer)
            })
            .collect()
    }

    #[test]
    fn test_price_cart_uses_list_price_and_accepted_offer() {
        let products = catalogue(vec![product(1, 10, 15_000, 5), product(2, 11, 8_000, 5)]);
        let offers = offers(&[(40, 2, 6_500)]);
        let cart = vec![cart_line(1, 1, 2, Some("M")), cart_line(2, 2, 1, None)];

        let priced = price_cart(&cart, &products, &offers).unwrap();
        let items = &priced.items;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].unit_price, Money::francs(15_000));
        assert_eq!(items[0].seller_id, UserId::new(10));
        assert_eq!(items[0].size.as_deref(), Some("M"));
        assert_eq!(items[1].unit_price, Money::francs(6_500));
        assert_eq!(order_total(items).unwrap(), Money::francs(36_500));
        assert_eq!(priced.offers_used, vec![NegotiationId::new(40)]);
    }

    #[test]
    fn test_price_cart_never_charges_above_list_price() {
        // Accepted at 8 000 while listed at 10 000; the vendor since cut the price.
        let products = catalogue(vec![product(1, 10, 5_000, 5)]);
        let offers = offers(&[(41, 1, 8_000)]);

        let priced = price_cart(&[cart_line(1, 1, 1, None)], &products, &offers).unwrap();

        assert_eq!(priced.items[0].unit_price, Money::francs(5_000));
        assert!(priced.offers_used.is_empty());
    }

    #[test]
    fn test_offer_used_once_across_variant_lines() {
        let products = catalogue(vec![product(1, 10, 12_000, 10)]);
        let offers = offers(&[(42, 1, 9_000)]);
        let cart = vec![cart_line(1, 1, 1, Some("S")), cart_line(2, 1, 2, Some("L"))];

        let priced = price_cart(&cart, &products, &offers).unwrap();

        assert!(priced.items.iter().all(|i| i.unit_price == Money::francs(9_000)));
        assert_eq!(priced.offers_used, vec![NegotiationId::new(42)]);
    }

    #[test]
    fn test_price_cart_rejects_inactive_or_missing_product() {
        let mut inactive = product(1, 10, 1_000, 5);
        inactive.is_active = false;
        let products = catalogue(vec![inactive]);

        let err = price_cart(&[cart_line(1, 1, 1, None)], &products, &HashMap::new()).unwrap_err();
        assert!(matches!(err, CheckoutError::Unavailable(id) if id == ProductId::new(1)));

        let err = price_cart(&[cart_line(1, 9, 1, None)], &products, &HashMap::new()).unwrap_err();
        assert!(matches!(err, CheckoutError::Unavailable(id) if id == ProductId::new(9)));
    }

    #[test]
    fn test_price_cart_checks_stock_across_variants() {
        let products = catalogue(vec![product(1, 10, 1_000, 3)]);
        let cart = vec![cart_line(1, 1, 2, Some("S")), cart_line(2, 1, 2, Some("L"))];

        let err = price_cart(&cart, &products, &HashMap::new()).unwrap_err();
        assert!(matches!(err, CheckoutError::OutOfStock { available: 3, .. }));
    }

    #[test]
    fn test_quantities_by_product() {
        let products = catalogue(vec![product(1, 10, 1_000, 10), product(2, 10, 1_000, 10)]);
        let cart = vec![
            cart_line(1, 1, 2, Some("S")),
            cart_line(2, 2, 1, None),
            cart_line(3, 1, 3, Some("L")),
        ];
        let items = price_cart(&cart, &products, &HashMap::new()).unwrap().items;

        assert_eq!(
            quantities_by_product(&items),
            vec![(ProductId::new(1), 5), (ProductId::new(2), 1)]
        );
    }

    #[test]
    fn test_list_query_by_role() {
        let admin = list_query(UserId::new(1), Role::Admin).into_sql();
        assert!(!admin.contains("WHERE"));

        let buyer = list_query(UserId::new(1), Role::Buyer).into_sql();
        assert!(buyer.contains("WHERE buyer_id = $1 ORDER BY"));

        let vendor = list_query(UserId::new(1), Role::Vendor).into_sql();
        assert!(vendor.contains("OR items @> $2"));

        let logistician = list_query(UserId::new(1), Role::Logistician).into_sql();
        assert!(logistician.contains("OR logistician_id = $2"));
        assert!(logistician.contains("status = 'shipped' AND logistician_id IS NULL"));
    }

    #[test]
    fn test_containment_filters() {
        assert_eq!(
            seller_filter(UserId::new(7)).to_string(),
            r#"[{"seller_id":7}]"#
        );
        assert_eq!(
            product_filter(ProductId::new(3)).to_string(),
            r#"[{"product_id":3}]"#
        );
    }
}
