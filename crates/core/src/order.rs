//! Order line items and the order status state machine.
//!
//! ```text
//! pending ──confirm──▶ confirmed ──ship──▶ shipped ──pick_up──▶ picked_up ──deliver──▶ delivered
//!    │                     │
//!    └──────cancel─────────┴──────▶ cancelled
//! ```
//!
//! Every status change goes through [`OrderTransition::apply`], which checks the
//! current status, and [`OrderTransition::authorize`], which checks who is asking.
//! Persisting the result is a compare-and-set on the previous status, so two
//! concurrent requests cannot both win.

use serde::{Deserialize, Serialize};

use crate::types::{Money, MoneyError, OrderStatus, ProductId, Role, UserId};

/// A purchased line, denormalized into the order at checkout.
///
/// Price and seller are copied so later product edits never change a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl OrderItem {
    /// `unit_price * quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on overflow.
    pub fn line_total(&self) -> Result<Money, MoneyError> {
        self.unit_price.times(self.quantity)
    }
}

/// Sum of all line totals.
///
/// # Errors
///
/// Returns [`MoneyError::Overflow`] on overflow.
pub fn order_total(items: &[OrderItem]) -> Result<Money, MoneyError> {
    items
        .iter()
        .try_fold(Money::ZERO, |acc, item| acc.checked_add(item.line_total()?))
}

/// Distinct sellers in an order, in first-seen order.
#[must_use]
pub fn seller_ids(items: &[OrderItem]) -> Vec<UserId> {
    let mut sellers: Vec<UserId> = Vec::new();
    for item in items {
        if !sellers.contains(&item.seller_id) {
            sellers.push(item.seller_id);
        }
    }
    sellers
}

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTransition {
    Confirm,
    Ship,
    PickUp,
    Deliver,
    Cancel,
}

/// How the acting user relates to a specific order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRelation {
    pub role: Role,
    /// The actor placed the order.
    pub is_buyer: bool,
    /// The actor sells at least one item in the order.
    pub is_vendor: bool,
    /// The actor is the logistician assigned to the order.
    pub is_assigned_logistician: bool,
}

impl OrderRelation {
    /// Work out the relation of `actor` to an order.
    #[must_use]
    pub fn of(
        actor: UserId,
        role: Role,
        buyer_id: UserId,
        items: &[OrderItem],
        logistician_id: Option<UserId>,
    ) -> Self {
        Self {
            role,
            is_buyer: actor == buyer_id,
            is_vendor: role == Role::Vendor && items.iter().any(|i| i.seller_id == actor),
            is_assigned_logistician: role == Role::Logistician && logistician_id == Some(actor),
        }
    }

    /// Whether the actor may see the order at all.
    #[must_use]
    pub const fn can_view(&self) -> bool {
        matches!(self.role, Role::Admin)
            || self.is_buyer
            || self.is_vendor
            || self.is_assigned_logistician
    }

    const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Why a transition was refused.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The order is not in a status this transition starts from.
    #[error("cannot {transition} an order that is {from}")]
    InvalidFrom {
        transition: OrderTransition,
        from: OrderStatus,
    },
    /// The actor is not allowed to perform this transition.
    #[error("not allowed to {transition} this order")]
    Forbidden { transition: OrderTransition },
    /// The status changed between read and write.
    #[error("order status changed concurrently (expected {expected})")]
    Stale { expected: OrderStatus },
}

impl OrderTransition {
    /// Every transition.
    pub const ALL: [Self; 5] = [
        Self::Confirm,
        Self::Ship,
        Self::PickUp,
        Self::Deliver,
        Self::Cancel,
    ];

    /// The status reached by a successful transition.
    #[must_use]
    pub const fn target(self) -> OrderStatus {
        match self {
            Self::Confirm => OrderStatus::Confirmed,
            Self::Ship => OrderStatus::Shipped,
            Self::PickUp => OrderStatus::PickedUp,
            Self::Deliver => OrderStatus::Delivered,
            Self::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Statuses this transition may start from.
    #[must_use]
    pub const fn sources(self) -> &'static [OrderStatus] {
        match self {
            Self::Confirm => &[OrderStatus::Pending],
            Self::Ship => &[OrderStatus::Confirmed],
            Self::PickUp => &[OrderStatus::Shipped],
            Self::Deliver => &[OrderStatus::PickedUp],
            Self::Cancel => &[OrderStatus::Pending, OrderStatus::Confirmed],
        }
    }

    /// Compute the next status from `from`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidFrom`] if `from` is not a source status.
    pub fn apply(self, from: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.sources().contains(&from) {
            Ok(self.target())
        } else {
            Err(TransitionError::InvalidFrom {
                transition: self,
                from,
            })
        }
    }

    /// Check that the actor may perform this transition from `from`.
    ///
    /// Admins may perform any transition. Vendors of the order confirm, ship,
    /// and cancel; the assigned logistician picks up and delivers; the buyer
    /// may cancel only while the order is still pending.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Forbidden`] if the actor lacks the right.
    pub const fn authorize(
        self,
        from: OrderStatus,
        relation: &OrderRelation,
    ) -> Result<(), TransitionError> {
        let allowed = relation.is_admin()
            || match self {
                Self::Confirm | Self::Ship => relation.is_vendor,
                Self::PickUp | Self::Deliver => relation.is_assigned_logistician,
                Self::Cancel => {
                    relation.is_vendor
                        || (relation.is_buyer && matches!(from, OrderStatus::Pending))
                }
            };

        if allowed {
            Ok(())
        } else {
            Err(TransitionError::Forbidden { transition: self })
        }
    }

    /// Validate the status first, then the actor.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidFrom`] or [`TransitionError::Forbidden`].
    pub fn check(
        self,
        from: OrderStatus,
        relation: &OrderRelation,
    ) -> Result<OrderStatus, TransitionError> {
        let next = self.apply(from)?;
        self.authorize(from, relation)?;
        Ok(next)
    }
}

impl std::fmt::Display for OrderTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Confirm => "confirm",
            Self::Ship => "ship",
            Self::PickUp => "pick_up",
            Self::Deliver => "deliver",
            Self::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// Position of a status on the forward path, `None` for `cancelled`.
#[must_use]
pub const fn forward_rank(status: OrderStatus) -> Option<u8> {
    match status {
        OrderStatus::Pending => Some(0),
        OrderStatus::Confirmed => Some(1),
        OrderStatus::Shipped => Some(2),
        OrderStatus::PickedUp => Some(3),
        OrderStatus::Delivered => Some(4),
        OrderStatus::Cancelled => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(seller: i32, price: u32, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(1),
            seller_id: UserId::new(seller),
            name: "Pagne wax".to_string(),
            unit_price: Money::francs(price),
            quantity,
            size: None,
            color: None,
        }
    }

    fn relation(role: Role) -> OrderRelation {
        OrderRelation {
            role,
            is_buyer: false,
            is_vendor: false,
            is_assigned_logistician: false,
        }
    }

    #[test]
    fn test_order_total() {
        let items = vec![item(10, 2_500, 2), item(11, 1_000, 3)];
        assert_eq!(order_total(&items).unwrap(), Money::francs(8_000));
        assert_eq!(order_total(&[]).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_seller_ids_are_distinct() {
        let items = vec![item(10, 1, 1), item(11, 1, 1), item(10, 1, 1)];
        assert_eq!(seller_ids(&items), vec![UserId::new(10), UserId::new(11)]);
    }

    #[test]
    fn test_happy_path() {
        let mut status = OrderStatus::Pending;
        for t in [
            OrderTransition::Confirm,
            OrderTransition::Ship,
            OrderTransition::PickUp,
            OrderTransition::Deliver,
        ] {
            status = t.apply(status).unwrap();
        }
        assert_eq!(status, OrderStatus::Delivered);
    }

    #[test]
    fn test_no_transition_skips_a_state() {
        for from in OrderStatus::ALL {
            for t in OrderTransition::ALL {
                let Ok(to) = t.apply(from) else { continue };
                if to == OrderStatus::Cancelled {
                    continue;
                }
                let (Some(a), Some(b)) = (forward_rank(from), forward_rank(to)) else {
                    panic!("forward transition from cancelled");
                };
                assert_eq!(b, a + 1, "{t} from {from} skipped a state");
            }
        }
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        for from in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            for t in OrderTransition::ALL {
                assert!(matches!(
                    t.apply(from),
                    Err(TransitionError::InvalidFrom { .. })
                ));
            }
        }
    }

    #[test]
    fn test_apply_only_from_sources() {
        for from in OrderStatus::ALL {
            for t in OrderTransition::ALL {
                assert_eq!(t.apply(from).is_ok(), t.sources().contains(&from));
            }
        }
    }

    #[test]
    fn test_relation_of() {
        let items = vec![item(10, 1, 1)];
        let vendor = OrderRelation::of(UserId::new(10), Role::Vendor, UserId::new(1), &items, None);
        assert!(vendor.is_vendor && !vendor.is_buyer);

        let courier = OrderRelation::of(
            UserId::new(20),
            Role::Logistician,
            UserId::new(1),
            &items,
            Some(UserId::new(20)),
        );
        assert!(courier.is_assigned_logistician);
        assert!(courier.can_view());

        let stranger = OrderRelation::of(UserId::new(99), Role::Buyer, UserId::new(1), &items, None);
        assert!(!stranger.can_view());
    }

    #[test]
    fn test_vendor_confirms_and_ships_but_does_not_deliver() {
        let rel = OrderRelation {
            is_vendor: true,
            ..relation(Role::Vendor)
        };
        assert!(OrderTransition::Confirm.check(OrderStatus::Pending, &rel).is_ok());
        assert!(OrderTransition::Ship.check(OrderStatus::Confirmed, &rel).is_ok());
        assert_eq!(
            OrderTransition::Deliver.check(OrderStatus::PickedUp, &rel),
            Err(TransitionError::Forbidden {
                transition: OrderTransition::Deliver
            })
        );
    }

    #[test]
    fn test_logistician_must_be_assigned() {
        let unassigned = relation(Role::Logistician);
        assert!(
            OrderTransition::PickUp
                .check(OrderStatus::Shipped, &unassigned)
                .is_err()
        );
        let assigned = OrderRelation {
            is_assigned_logistician: true,
            ..unassigned
        };
        assert_eq!(
            OrderTransition::PickUp.check(OrderStatus::Shipped, &assigned),
            Ok(OrderStatus::PickedUp)
        );
    }

    #[test]
    fn test_buyer_cancels_only_pending() {
        let buyer = OrderRelation {
            is_buyer: true,
            ..relation(Role::Buyer)
        };
        assert!(OrderTransition::Cancel.check(OrderStatus::Pending, &buyer).is_ok());
        assert!(matches!(
            OrderTransition::Cancel.check(OrderStatus::Confirmed, &buyer),
            Err(TransitionError::Forbidden { .. })
        ));
        assert!(matches!(
            OrderTransition::Confirm.check(OrderStatus::Pending, &buyer),
            Err(TransitionError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_admin_can_do_anything_valid() {
        let admin = relation(Role::Admin);
        for from in OrderStatus::ALL {
            for t in OrderTransition::ALL {
                assert_eq!(t.check(from, &admin).is_ok(), t.apply(from).is_ok());
            }
        }
    }

    #[test]
    fn test_status_is_checked_before_actor() {
        let stranger = relation(Role::Buyer);
        assert!(matches!(
            OrderTransition::Ship.check(OrderStatus::Delivered, &stranger),
            Err(TransitionError::InvalidFrom { .. })
        ));
    }
}
