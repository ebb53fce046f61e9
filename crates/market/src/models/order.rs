//! Order domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mayombe_core::order::{OrderItem, OrderRelation};
use mayombe_core::payout::VendorShare;
use mayombe_core::{Money, OrderId, OrderStatus, PaymentMethod, PayoutStatus, UserId};

use super::CurrentUser;

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_phone: Option<String>,
    pub logistician_id: Option<UserId>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub payout_status: PayoutStatus,
    pub payout_released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// How `user` relates to this order.
    #[must_use]
    pub fn relation(&self, user: &CurrentUser) -> OrderRelation {
        OrderRelation::of(
            user.id,
            user.role,
            self.buyer_id,
            &self.items,
            self.logistician_id,
        )
    }
}

/// Checkout request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_phone: Option<String>,
}

/// Body of `POST /api/orders/{id}/assign`. Empty for a logistician claim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignRequest {
    pub logistician_id: Option<UserId>,
}

/// One line of a vendor's payout summary.
#[derive(Debug, Clone, Serialize)]
pub struct VendorPayout {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub payout_status: PayoutStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Earliest release time, once delivered.
    pub release_at: Option<DateTime<Utc>>,
    pub payout_released_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub share: VendorShare,
}
