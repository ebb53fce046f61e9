//! Checkout, order lifecycle, logistics assignment and vendor payouts.
//!
//! Every status write is compare-and-set on the status the caller saw. When
//! another request got there first the write affects no row and the caller
//! gets a conflict instead of overwriting the newer state.

use chrono::Utc;
use tracing::instrument;

use mayombe_core::order::{OrderTransition, TransitionError};
use mayombe_core::payout::PayoutError;
use mayombe_core::{OrderId, OrderStatus, PayoutStatus, Role, UserId};

use crate::db::{OrderRepository, ProfileRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{AssignRequest, CheckoutRequest, CurrentUser, Order, VendorPayout};
use crate::services::events::OrderEvent;
use crate::state::AppState;

/// Order operations for the acting user.
pub struct OrderService<'a> {
    state: &'a AppState,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn orders(&self) -> OrderRepository<'a> {
        OrderRepository::new(self.state.pool())
    }

    /// Turn the user's cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Checkout` for an empty cart, an unavailable product,
    /// or insufficient stock.
    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn checkout(&self, user: &CurrentUser, request: &CheckoutRequest) -> Result<Order> {
        let order = self.orders().checkout(user.id, request).await?;

        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
        add_breadcrumb(
            "order",
            "Order placed",
            Some(&[("order_id", &order.id.to_string())]),
        );

        self.invalidate_products(&order).await;
        self.announce(&order);
        self.state.notifier().order_placed(&order);
        Ok(order)
    }

    /// Orders visible to the user given their role.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, user: &CurrentUser) -> Result<Vec<Order>> {
        Ok(self.orders().list_for(user.id, user.role).await?)
    }

    /// One order, if the user may see it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist or the user
    /// has no relation to it.
    #[instrument(skip(self, user), fields(user_id = %user.id, order_id = %id))]
    pub async fn get(&self, user: &CurrentUser, id: OrderId) -> Result<Order> {
        let order = self.load(id).await?;
        if !may_view(user, &order) {
            return Err(AppError::NotFound("Order".to_string()));
        }
        Ok(order)
    }

    /// Move an order one step through its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an order the user cannot see and
    /// `AppError::Transition` if the step is not allowed from the current
    /// status, the user may not perform it, or a concurrent change won.
    #[instrument(skip(self, user), fields(user_id = %user.id, order_id = %id))]
    pub async fn transition(
        &self,
        user: &CurrentUser,
        id: OrderId,
        transition: OrderTransition,
    ) -> Result<Order> {
        let order = self.get(user, id).await?;
        let from = order.status;
        transition.check(from, &order.relation(user))?;

        let updated = self
            .orders()
            .transition(id, from, transition)
            .await?
            .ok_or(TransitionError::Stale { expected: from })?;

        tracing::info!(from = %from, to = %updated.status, "Order status changed");
        add_breadcrumb(
            "order",
            "Order status changed",
            Some(&[
                ("order_id", &updated.id.to_string()),
                ("status", &updated.status.to_string()),
            ]),
        );

        if transition == OrderTransition::Cancel {
            self.invalidate_products(&updated).await;
        }
        self.announce(&updated);
        self.state.notifier().order_status_changed(&updated);
        Ok(updated)
    }

    /// Assign a logistician to an order.
    ///
    /// Admins name the logistician for a confirmed or shipped order. A
    /// logistician sends no target (or themself) to claim an unassigned
    /// shipped order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for other roles, `AppError::BadRequest`
    /// if the target is not a logistician, and `AppError::Conflict` if the
    /// order is not in an assignable state.
    #[instrument(skip(self, user, request), fields(user_id = %user.id, order_id = %id))]
    pub async fn assign(
        &self,
        user: &CurrentUser,
        id: OrderId,
        request: &AssignRequest,
    ) -> Result<Order> {
        let assigned = match user.role {
            Role::Admin => {
                let target = request.logistician_id.ok_or_else(|| {
                    AppError::BadRequest("logistician_id is required".to_string())
                })?;
                self.ensure_logistician(target).await?;
                self.load(id).await?;
                self.orders().assign(id, target).await?.ok_or_else(|| {
                    AppError::Conflict(
                        "Only confirmed or shipped orders can be assigned".to_string(),
                    )
                })?
            }
            Role::Logistician => {
                if request.logistician_id.is_some_and(|target| target != user.id) {
                    return Err(AppError::Forbidden(
                        "Logisticians can only claim orders for themselves".to_string(),
                    ));
                }
                self.load(id).await?;
                self.orders().claim(id, user.id).await?.ok_or_else(|| {
                    AppError::Conflict("Order is not available for pickup".to_string())
                })?
            }
            Role::Buyer | Role::Vendor => {
                return Err(AppError::Forbidden(
                    "Only admins and logisticians can assign orders".to_string(),
                ));
            }
        };

        tracing::info!(
            logistician_id = ?assigned.logistician_id,
            "Logistician assigned"
        );
        self.announce(&assigned);
        Ok(assigned)
    }

    /// The vendor's share of every non-cancelled order containing their
    /// products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` unless the user is a vendor.
    pub async fn payouts(&self, user: &CurrentUser) -> Result<Vec<VendorPayout>> {
        if user.role != Role::Vendor {
            return Err(AppError::Forbidden(
                "Only vendors have payouts".to_string(),
            ));
        }
        let policy = self.state.payout_policy();

        self.orders()
            .sold_by(user.id)
            .await?
            .into_iter()
            .map(|order| {
                Ok::<_, AppError>(VendorPayout {
                    order_id: order.id,
                    order_status: order.status,
                    payout_status: order.payout_status,
                    delivered_at: order.delivered_at,
                    release_at: order.delivered_at.map(|at| policy.release_at(at)),
                    payout_released_at: order.payout_released_at,
                    share: policy.vendor_share(&order.items, user.id)?,
                })
            })
            .collect()
    }

    /// Release a held payout once the confirmation window has passed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins and `AppError::Payout` if
    /// the payout is not held or the window is still open.
    #[instrument(skip(self, user), fields(user_id = %user.id, order_id = %id))]
    pub async fn release_payout(&self, user: &CurrentUser, id: OrderId) -> Result<Order> {
        if !user.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can release payouts".to_string(),
            ));
        }
        let order = self.load(id).await?;
        self.state
            .payout_policy()
            .check_release(order.payout_status, order.delivered_at, Utc::now())?;

        let released = self
            .orders()
            .release_payout(id)
            .await?
            .ok_or(PayoutError::NotHeld(PayoutStatus::Released))?;

        tracing::info!("Payout released");
        Ok(released)
    }

    async fn load(&self, id: OrderId) -> Result<Order> {
        self.orders()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    async fn ensure_logistician(&self, id: UserId) -> Result<()> {
        let profile = ProfileRepository::new(self.state.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;
        if profile.role != Role::Logistician {
            return Err(AppError::BadRequest(
                "Orders can only be assigned to logisticians".to_string(),
            ));
        }
        Ok(())
    }

    /// Stock changed, so cached product pages are stale.
    async fn invalidate_products(&self, order: &Order) {
        let cache = self.state.product_cache();
        for item in &order.items {
            cache.invalidate(&item.product_id).await;
        }
    }

    fn announce(&self, order: &Order) {
        self.state.events().publish(OrderEvent::from_order(order));
    }
}

/// Related users may view an order. Logisticians may also view the shipped,
/// unassigned orders they can claim.
fn may_view(user: &CurrentUser, order: &Order) -> bool {
    order.relation(user).can_view()
        || (user.role == Role::Logistician
            && order.status == OrderStatus::Shipped
            && order.logistician_id.is_none())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use mayombe_core::order::OrderItem;
    use mayombe_core::{Email, Money, PaymentMethod, ProductId};

    use super::*;

    fn user(id: i32, role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: Email::parse("user@mayombe.cg").unwrap(),
            full_name: "Test".to_string(),
            role,
        }
    }

    fn order(status: OrderStatus, logistician: Option<i32>) -> Order {
        Order {
            id: OrderId::new(1),
            buyer_id: UserId::new(10),
            items: vec![OrderItem {
                product_id: ProductId::new(5),
                seller_id: UserId::new(20),
                name: "Panier tressé".to_string(),
                unit_price: Money::francs(3_000),
                quantity: 1,
                size: None,
                color: None,
            }],
            total: Money::francs(3_000),
            status,
            payment_method: PaymentMethod::CashOnDelivery,
            delivery_address: None,
            delivery_city: Some("Pointe-Noire".to_string()),
            delivery_phone: None,
            logistician_id: logistician.map(UserId::new),
            confirmed_at: None,
            shipped_at: None,
            picked_up_at: None,
            delivered_at: None,
            cancelled_at: None,
            payout_status: PayoutStatus::NotDue,
            payout_released_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parties_may_view() {
        let o = order(OrderStatus::Pending, None);
        assert!(may_view(&user(10, Role::Buyer), &o));
        assert!(may_view(&user(20, Role::Vendor), &o));
        assert!(may_view(&user(1, Role::Admin), &o));
        assert!(!may_view(&user(11, Role::Buyer), &o));
        assert!(!may_view(&user(21, Role::Vendor), &o));
    }

    #[test]
    fn test_logistician_sees_claimable_orders_only() {
        let courier = user(30, Role::Logistician);

        assert!(may_view(&courier, &order(OrderStatus::Shipped, None)));
        assert!(!may_view(&courier, &order(OrderStatus::Confirmed, None)));
        assert!(!may_view(&courier, &order(OrderStatus::Shipped, Some(31))));
        assert!(may_view(&courier, &order(OrderStatus::PickedUp, Some(30))));
    }
}
