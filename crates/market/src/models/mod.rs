//! Domain models for the market service.
//!
//! These are the validated types handlers and services work with; database
//! row types stay private to the repositories in [`crate::db`].

pub mod cart;
pub mod negotiation;
pub mod order;
pub mod product;
pub mod profile;
pub mod rating;
pub mod session;

pub use cart::{AddToCart, CartItem, CartSync, CartView, SetQuantity};
pub use negotiation::{Negotiation, NewOffer};
pub use order::{AssignRequest, CheckoutRequest, Order, VendorPayout};
pub use product::{NewProduct, Product, ProductDetail, ProductQuery, ProductSort, ProductUpdate};
pub use profile::{Profile, ProfileUpdate, SellerSummary};
pub use rating::{NewRating, Rating};
pub use session::{CurrentUser, keys as session_keys};
