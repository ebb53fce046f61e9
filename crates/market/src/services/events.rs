//! In-process order event bus.
//!
//! Every committed order change is published on a `tokio::sync::broadcast`
//! channel. Subscribers that fall behind skip the events they missed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use mayombe_core::order::seller_ids;
use mayombe_core::{OrderId, OrderStatus, Role, UserId};

use crate::models::Order;

/// Buffered events per subscriber before it starts lagging.
pub const EVENT_CAPACITY: usize = 256;

/// A committed order status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderEvent {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub buyer_id: UserId,
    pub seller_ids: Vec<UserId>,
    pub logistician_id: Option<UserId>,
    pub at: DateTime<Utc>,
}

impl OrderEvent {
    /// Snapshot of an order after a write.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            buyer_id: order.buyer_id,
            seller_ids: seller_ids(&order.items),
            logistician_id: order.logistician_id,
            at: order.updated_at,
        }
    }

    /// Whether a user with `role` should receive this event.
    #[must_use]
    pub fn involves(&self, user: UserId, role: Role) -> bool {
        role == Role::Admin
            || self.buyer_id == user
            || self.seller_ids.contains(&user)
            || self.logistician_id == Some(user)
    }
}

/// Publisher side of the order event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OrderEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Having no subscriber is not an error.
    pub fn publish(&self, event: OrderEvent) {
        let order_id = event.order_id;
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(%order_id, receivers, "Order event published"),
            Err(_) => tracing::trace!(%order_id, "Order event dropped, no subscribers"),
        }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event() -> OrderEvent {
        OrderEvent {
            order_id: OrderId::new(1),
            status: OrderStatus::Shipped,
            buyer_id: UserId::new(10),
            seller_ids: vec![UserId::new(20), UserId::new(21)],
            logistician_id: Some(UserId::new(30)),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_involves() {
        let event = event();

        assert!(event.involves(UserId::new(10), Role::Buyer));
        assert!(event.involves(UserId::new(21), Role::Vendor));
        assert!(event.involves(UserId::new(30), Role::Logistician));
        assert!(event.involves(UserId::new(99), Role::Admin));
        assert!(!event.involves(UserId::new(99), Role::Buyer));
        assert!(!event.involves(UserId::new(31), Role::Logistician));
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(event());

        assert_eq!(first.recv().await.unwrap().order_id, OrderId::new(1));
        assert_eq!(second.recv().await.unwrap().status, OrderStatus::Shipped);
    }

    #[test]
    fn test_publish_without_subscribers() {
        EventBus::default().publish(event());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for id in 1..=3 {
            bus.publish(OrderEvent {
                order_id: OrderId::new(id),
                ..event()
            });
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap().order_id, OrderId::new(2));
    }
}
