//! Server-side cart types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mayombe_core::cart::CartLine;
use mayombe_core::{CartItemId, ProductId};

/// A persisted cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// The line this item represents, for merging.
    #[must_use]
    pub fn line(&self) -> CartLine {
        CartLine {
            product_id: self.product_id,
            quantity: self.quantity,
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }
}

/// Body of `POST /api/cart`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Body of `PUT /api/cart/{item_id}`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SetQuantity {
    pub quantity: u32,
}

/// Body of `POST /api/cart/sync`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartSync {
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

/// Cart response; `clear_local` tells the client to drop its stored guest cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u64,
    pub clear_local: bool,
}

impl CartView {
    #[must_use]
    pub fn new(items: Vec<CartItem>, clear_local: bool) -> Self {
        let lines: Vec<CartLine> = items.iter().map(CartItem::line).collect();
        Self {
            item_count: mayombe_core::cart::item_count(&lines),
            items,
            clear_local,
        }
    }
}
