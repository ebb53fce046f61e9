//! Product rating types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mayombe_core::rating::Stars;
use mayombe_core::{ProductId, RatingId, UserId};

/// A buyer's rating of a product.
#[derive(Debug, Clone, Serialize)]
pub struct Rating {
    pub id: RatingId,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub buyer_name: String,
    pub stars: Stars,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/products/{id}/ratings`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRating {
    pub stars: Stars,
    pub comment: Option<String>,
}
