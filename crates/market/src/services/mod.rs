//! Business logic between the HTTP routes and the repositories.
//!
//! Services enforce ownership and role rules, call into the pure rules in
//! `mayombe_core`, and trigger side effects (cache invalidation, order events,
//! email) after a write commits.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod events;
pub mod negotiations;
pub mod notify;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use events::{EventBus, OrderEvent};
pub use negotiations::NegotiationService;
pub use notify::{Notifier, NotifyError};
pub use orders::OrderService;
