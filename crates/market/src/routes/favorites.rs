//! Favorite products.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use mayombe_core::ProductId;

use crate::db::{FavoriteRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{product_id}", post(add).delete(remove))
}

/// GET /api/favorites
async fn list(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .favorites_of(user.id)
        .await?;
    Ok(Json(products))
}

/// POST /api/favorites/{product_id}
async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    FavoriteRepository::new(state.pool())
        .add(user.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/favorites/{product_id}
async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    FavoriteRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
