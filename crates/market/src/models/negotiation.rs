//! Price negotiation types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mayombe_core::{Money, NegotiationId, NegotiationStatus, OrderId, ProductId, UserId};

/// A buyer's offer on a product.
#[derive(Debug, Clone, Serialize)]
pub struct Negotiation {
    pub id: NegotiationId,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    /// Listed price when the offer was made.
    pub initial_price: Money,
    pub proposed_price: Money,
    pub status: NegotiationStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    /// Order whose checkout used this accepted offer.
    pub used_order_id: Option<OrderId>,
}

/// Body of `POST /api/negotiations`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOffer {
    pub product_id: ProductId,
    pub proposed_price: Money,
}
