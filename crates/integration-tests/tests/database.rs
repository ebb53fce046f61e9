//! Repository and service tests against a real `PostgreSQL` database.
//!
//! Set `TEST_DATABASE_URL` to a disposable database and run with
//! `cargo test -p mayombe-integration-tests -- --ignored`. Migrations are
//! applied on connect; every test creates its own accounts and products.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use mayombe_core::cart::CartLine;
use mayombe_core::negotiation::{OfferError, OfferResponse};
use mayombe_core::{Money, NegotiationStatus, Role};
use mayombe_integration_tests::test_config;
use mayombe_market::db::{CartRepository, NegotiationRepository, OrderRepository, ProductRepository};
use mayombe_market::error::AppError;
use mayombe_market::models::{
    CheckoutRequest, CurrentUser, Negotiation, NewProduct, Product, Profile, ProductUpdate,
};
use mayombe_market::services::{AuthService, NegotiationService};
use mayombe_market::state::AppState;
use rand::Rng;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

async fn pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("../market/migrations").run(&pool).await.unwrap();
    pool
}

async fn account(pool: &PgPool, role: Role) -> Profile {
    let tag: u32 = rand::rng().random();
    AuthService::new(pool)
        .create_account(
            &format!("{role}-{tag}@example.cg"),
            "Pointe-Noire-2026!",
            "Test Account",
            role,
        )
        .await
        .unwrap()
}

async fn product(pool: &PgPool, seller: &Profile, price: u32) -> Product {
    ProductRepository::new(pool)
        .create(
            seller.id,
            &NewProduct {
                name: "Pagne wax".to_string(),
                description: String::new(),
                category: "textile".to_string(),
                price: Money::francs(price),
                stock: 10,
                sizes: vec!["M".to_string(), "L".to_string()],
                colors: Vec::new(),
                image_url: None,
            },
        )
        .await
        .unwrap()
}

async fn reprice(pool: &PgPool, product: &Product, price: u32) {
    ProductRepository::new(pool)
        .update(
            product.id,
            &ProductUpdate {
                price: Some(Money::francs(price)),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
}

async fn offer(pool: &PgPool, buyer: &Profile, product: &Product, proposed: u32) -> Negotiation {
    NegotiationRepository::new(pool)
        .create(
            product.id,
            buyer.id,
            product.seller_id,
            product.price,
            Money::francs(proposed),
        )
        .await
        .unwrap()
}

async fn accepted_offer(
    pool: &PgPool,
    buyer: &Profile,
    product: &Product,
    proposed: u32,
) -> Negotiation {
    let pending = offer(pool, buyer, product, proposed).await;
    NegotiationRepository::new(pool)
        .respond(pending.id, NegotiationStatus::Accepted)
        .await
        .unwrap()
        .unwrap()
}

fn line(product: &Product, quantity: u32, size: Option<&str>) -> CartLine {
    CartLine {
        product_id: product.id,
        quantity,
        size: size.map(str::to_string),
        color: None,
    }
}

// =============================================================================
// Checkout pricing
// =============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_checkout_never_charges_above_lowered_list_price() {
    let pool = pool().await;
    let vendor = account(&pool, Role::Vendor).await;
    let buyer = account(&pool, Role::Buyer).await;
    let item = product(&pool, &vendor, 10_000).await;
    let deal = accepted_offer(&pool, &buyer, &item, 8_000).await;

    reprice(&pool, &item, 7_000).await;
    CartRepository::new(&pool)
        .add(buyer.id, &line(&item, 2, Some("M")))
        .await
        .unwrap();
    let order = OrderRepository::new(&pool)
        .checkout(buyer.id, &CheckoutRequest::default())
        .await
        .unwrap();

    assert_eq!(order.items[0].unit_price, Money::francs(7_000));
    assert_eq!(order.total, Money::francs(14_000));
    let deal = NegotiationRepository::new(&pool)
        .get(deal.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deal.used_order_id, None);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_accepted_offer_applies_to_one_order_only() {
    let pool = pool().await;
    let vendor = account(&pool, Role::Vendor).await;
    let buyer = account(&pool, Role::Buyer).await;
    let item = product(&pool, &vendor, 10_000).await;
    let deal = accepted_offer(&pool, &buyer, &item, 8_000).await;
    let cart = CartRepository::new(&pool);
    let orders = OrderRepository::new(&pool);

    cart.add(buyer.id, &line(&item, 1, Some("M"))).await.unwrap();
    cart.add(buyer.id, &line(&item, 1, Some("L"))).await.unwrap();
    let first = orders
        .checkout(buyer.id, &CheckoutRequest::default())
        .await
        .unwrap();
    assert!(
        first
            .items
            .iter()
            .all(|i| i.unit_price == Money::francs(8_000))
    );

    cart.add(buyer.id, &line(&item, 1, Some("M"))).await.unwrap();
    let second = orders
        .checkout(buyer.id, &CheckoutRequest::default())
        .await
        .unwrap();
    assert_eq!(second.items[0].unit_price, Money::francs(10_000));

    let deal = NegotiationRepository::new(&pool)
        .get(deal.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deal.used_order_id, Some(first.id));
}

// =============================================================================
// Offers
// =============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_accept_refused_after_price_cut() {
    let pool = pool().await;
    let state = AppState::new(test_config(), pool.clone()).unwrap();
    let vendor = account(&pool, Role::Vendor).await;
    let buyer = account(&pool, Role::Buyer).await;
    let item = product(&pool, &vendor, 10_000).await;
    let pending = offer(&pool, &buyer, &item, 8_000).await;

    reprice(&pool, &item, 7_000).await;
    let result = NegotiationService::new(&state)
        .answer(&CurrentUser::from(&vendor), pending.id, OfferResponse::Accept)
        .await;

    assert!(matches!(
        result,
        Err(AppError::Offer(OfferError::NotBelowListed { .. }))
    ));
    let stored = NegotiationRepository::new(&pool)
        .get(pending.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, NegotiationStatus::Pending);
}

// =============================================================================
// Cart concurrency
// =============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_add_racing_guest_merge_keeps_both_lines() {
    let pool = pool().await;
    let vendor = account(&pool, Role::Vendor).await;
    let buyer = account(&pool, Role::Buyer).await;
    let shirt = product(&pool, &vendor, 4_000).await;
    let wrap = product(&pool, &vendor, 6_000).await;
    let cart = CartRepository::new(&pool);

    for _ in 0..10 {
        cart.clear(buyer.id).await.unwrap();
        let guest = [line(&wrap, 1, None)];
        let added_line = line(&shirt, 1, Some("M"));
        let (added, merged) = tokio::join!(
            cart.add(buyer.id, &added_line),
            cart.merge_guest(buyer.id, &guest),
        );
        added.unwrap();
        merged.unwrap();

        let items = cart.list(buyer.id).await.unwrap();
        assert!(items.iter().any(|i| i.product_id == shirt.id));
        assert!(items.iter().any(|i| i.product_id == wrap.id));
    }
}
