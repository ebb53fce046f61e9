//! HTTP route handlers for the market API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (strict rate limit)
//! POST /api/auth/register            - Create an account and sign in
//! POST /api/auth/login               - Sign in, merging the guest cart
//! POST /api/auth/logout              - Sign out
//! GET  /api/auth/me                  - Session user
//!
//! # Profile
//! GET  /api/profile                  - Own profile
//! PUT  /api/profile                  - Update own profile
//!
//! # Catalogue
//! GET  /api/products                 - Search
//! POST /api/products                 - List a product (vendor)
//! GET  /api/products/{id}            - Detail with rating summary
//! PUT  /api/products/{id}            - Update (owner, admin)
//! DELETE /api/products/{id}          - Deactivate (owner, admin)
//! GET  /api/products/{id}/ratings    - Ratings
//! POST /api/products/{id}/ratings    - Rate a received product
//!
//! # Cart
//! GET  /api/cart                     - Server cart
//! POST /api/cart                     - Add a line
//! DELETE /api/cart                   - Empty the cart
//! PUT  /api/cart/{item_id}           - Set quantity
//! DELETE /api/cart/{item_id}         - Remove a line
//! POST /api/cart/sync                - Merge a guest cart
//!
//! # Orders
//! POST /api/orders                   - Checkout
//! GET  /api/orders                   - Orders visible to the user
//! GET  /api/orders/events            - Order event stream (SSE)
//! GET  /api/orders/{id}              - One order
//! POST /api/orders/{id}/confirm      - pending -> confirmed
//! POST /api/orders/{id}/ship         - confirmed -> shipped
//! POST /api/orders/{id}/pick-up      - shipped -> picked_up
//! POST /api/orders/{id}/deliver      - picked_up -> delivered
//! POST /api/orders/{id}/cancel       - pending|confirmed -> cancelled
//! POST /api/orders/{id}/assign       - Assign or claim a logistician
//!
//! # Negotiations
//! POST /api/negotiations             - Make an offer
//! GET  /api/negotiations             - Own or received offers
//! POST /api/negotiations/{id}/accept - Accept (seller)
//! POST /api/negotiations/{id}/reject - Reject (seller)
//!
//! # Social
//! GET  /api/favorites                - Favorite products
//! POST /api/favorites/{product_id}   - Add favorite
//! DELETE /api/favorites/{product_id} - Remove favorite
//! GET  /api/follows                  - Followed sellers
//! POST /api/follows/{seller_id}      - Follow
//! DELETE /api/follows/{seller_id}    - Unfollow
//! GET  /api/sellers/{id}/followers   - Follower count
//!
//! # Payouts and administration
//! GET  /api/payouts                              - Vendor payout summary
//! POST /api/admin/orders/{id}/release-payout     - Release a held payout
//! PUT  /api/admin/profiles/{id}/role             - Change a role
//!
//! # Content
//! GET  /api/pages/{slug}             - Informational page
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod favorites;
pub mod follows;
pub mod negotiations;
pub mod orders;
pub mod pages;
pub mod products;
pub mod profile;

use axum::Router;

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Every `/api` route except authentication.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/profile", profile::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/negotiations", negotiations::router())
        .nest("/favorites", favorites::router())
        .merge(follows::router())
        .route("/payouts", axum::routing::get(orders::payouts))
        .nest("/admin", admin::router())
        .nest("/pages", pages::router())
}

/// All API routes with their rate limits.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::router().layer(auth_rate_limiter()))
        .nest("/api", api_routes().layer(api_rate_limiter()))
}
