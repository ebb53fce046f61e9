//! Mayombe Market Core - Shared types and marketplace rules.
//!
//! This crate provides the domain vocabulary used by every Mayombe Market component:
//! - `market` - JSON API for buyers, vendors, logisticians, and admins
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database access,
//! no HTTP clients. Rules that decide *whether* something may happen live here;
//! the market service decides *how* it is persisted.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, and statuses
//! - [`cart`] - Cart lines and guest/server cart merging
//! - [`order`] - Order line items and the order status state machine
//! - [`negotiation`] - Price offer validation and responses
//! - [`payout`] - Vendor payout and loyalty point arithmetic
//! - [`rating`] - Product rating validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod negotiation;
pub mod order;
pub mod payout;
pub mod rating;
pub mod types;

pub use types::*;
