//! Status and role enums shared between the API and the database.
//!
//! With the `postgres` feature these map onto the enum types created in the
//! `market` schema by the migrations.

use serde::{Deserialize, Serialize};

/// Marketplace role of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "market.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Buys products, proposes prices, rates purchases.
    #[default]
    Buyer,
    /// Lists products and fulfils the vendor side of orders.
    Vendor,
    /// Picks up and delivers parcels.
    Logistician,
    /// Full access, including role assignment and payouts.
    Admin,
}

impl Role {
    /// Roles a visitor may pick for themselves at registration.
    #[must_use]
    pub const fn is_self_assignable(self) -> bool {
        matches!(self, Self::Buyer | Self::Vendor)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Vendor => write!(f, "vendor"),
            Self::Logistician => write!(f, "logistician"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "vendor" => Ok(Self::Vendor),
            "logistician" => Ok(Self::Logistician),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Order lifecycle status.
///
/// The allowed moves between these values are defined by
/// [`OrderTransition`](crate::order::OrderTransition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "market.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    PickedUp,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipped,
        Self::PickedUp,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// French label used in notifications.
    #[must_use]
    pub const fn label_fr(self) -> &'static str {
        match self {
            Self::Pending => "en attente",
            Self::Confirmed => "confirmée",
            Self::Shipped => "expédiée",
            Self::PickedUp => "prise en charge par le livreur",
            Self::Delivered => "livrée",
            Self::Cancelled => "annulée",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::PickedUp => "picked_up",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Price negotiation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "market.negotiation_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for NegotiationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Vendor payout status for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "market.payout_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Order not delivered yet.
    #[default]
    NotDue,
    /// Delivered; held until the confirmation window has passed.
    Held,
    /// Paid out to vendors.
    Released,
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotDue => "not_due",
            Self::Held => "held",
            Self::Released => "released",
        };
        f.write_str(s)
    }
}

/// How the buyer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "market.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    /// MTN `MoMo` or Airtel Money.
    MobileMoney,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display_and_parse_agree() {
        for role in [Role::Buyer, Role::Vendor, Role::Logistician, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("courier".parse::<Role>().is_err());
    }

    #[test]
    fn test_self_assignable_roles() {
        assert!(Role::Buyer.is_self_assignable());
        assert!(Role::Vendor.is_self_assignable());
        assert!(!Role::Logistician.is_self_assignable());
        assert!(!Role::Admin.is_self_assignable());
    }

    #[test]
    fn test_order_status_serde_matches_display() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn test_offer_and_payout_display_match_serde() {
        for status in [
            NegotiationStatus::Pending,
            NegotiationStatus::Accepted,
            NegotiationStatus::Rejected,
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{status}\""));
        }
        for status in [PayoutStatus::NotDue, PayoutStatus::Held, PayoutStatus::Released] {
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{status}\""));
        }
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![OrderStatus::Delivered, OrderStatus::Cancelled]);
    }
}
