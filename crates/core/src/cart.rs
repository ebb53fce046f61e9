//! Cart lines and guest/server cart reconciliation.
//!
//! A visitor fills a cart in browser storage before signing in. At sign-in the
//! browser submits those lines and they are folded into the cart persisted for
//! the account: lines for the same product *and* variant add up, anything else
//! is appended after the server lines.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Largest quantity persisted for a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Errors for invalid cart input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A line must hold at least one unit.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// A line cannot exceed [`MAX_LINE_QUANTITY`].
    #[error("quantity cannot exceed {max}")]
    QuantityTooLarge {
        /// The per-line maximum.
        max: u32,
    },
}

/// A product in a cart, with its selected variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Identity of a cart line: product plus normalized variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartKey {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartLine {
    /// Build a validated line. Variant attributes are normalized so that
    /// `" M "` and `"M"` name the same size, and blank values mean "none".
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the quantity is zero or above [`MAX_LINE_QUANTITY`].
    pub fn new(
        product_id: ProductId,
        quantity: u32,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<Self, CartError> {
        validate_quantity(quantity)?;
        Ok(Self {
            product_id,
            quantity,
            size: normalize_variant(size),
            color: normalize_variant(color),
        })
    }

    /// The merge key for this line.
    #[must_use]
    pub fn key(&self) -> CartKey {
        CartKey {
            product_id: self.product_id,
            size: normalize_variant(self.size.as_deref()),
            color: normalize_variant(self.color.as_deref()),
        }
    }

    /// Copy of this line with the quantity capped at [`MAX_LINE_QUANTITY`].
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.quantity = self.quantity.min(MAX_LINE_QUANTITY);
        self
    }
}

/// Check a quantity submitted for a single line.
///
/// # Errors
///
/// Returns [`CartError`] if the quantity is zero or above [`MAX_LINE_QUANTITY`].
pub const fn validate_quantity(quantity: u32) -> Result<(), CartError> {
    if quantity == 0 {
        return Err(CartError::ZeroQuantity);
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::QuantityTooLarge {
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

fn normalize_variant(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Merge a guest cart into the server cart.
///
/// Server lines keep their order and come first; local lines whose key is not
/// already present follow in local order. Quantities for equal keys are summed
/// (saturating). Lines with zero quantity are dropped. Variants in the output
/// are normalized.
///
/// Merging is not idempotent: submitting the same guest cart twice counts its
/// quantities twice.
#[must_use]
pub fn merge(local: &[CartLine], server: &[CartLine]) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(local.len() + server.len());
    let mut positions: HashMap<CartKey, usize> = HashMap::new();

    for line in server.iter().chain(local) {
        if line.quantity == 0 {
            continue;
        }
        let key = line.key();
        if let Some(existing) = positions.get(&key).and_then(|&i| merged.get_mut(i)) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            positions.insert(key.clone(), merged.len());
            merged.push(CartLine {
                product_id: key.product_id,
                quantity: line.quantity,
                size: key.size,
                color: key.color,
            });
        }
    }

    merged
}

/// Total units across all lines.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|l| u64::from(l.quantity)).sum()
}
