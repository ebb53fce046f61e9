//! Server cart routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use mayombe_core::CartItemId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{AddToCart, CartSync, CartView, SetQuantity};
use crate::services::CartService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).post(add).delete(clear))
        .route("/sync", post(sync))
        .route("/{item_id}", put(set_quantity).delete(remove))
}

/// GET /api/cart
async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<CartView>> {
    let items = CartService::new(state.pool()).list(user.id).await?;
    Ok(Json(CartView::new(items, false)))
}

/// POST /api/cart
async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddToCart>,
) -> Result<impl IntoResponse> {
    let item = CartService::new(state.pool()).add(user.id, &body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/cart/{item_id}
async fn set_quantity(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<SetQuantity>,
) -> Result<impl IntoResponse> {
    let item = CartService::new(state.pool())
        .set_quantity(user.id, item_id, body.quantity)
        .await?;
    Ok(Json(item))
}

/// DELETE /api/cart/{item_id}
async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<StatusCode> {
    CartService::new(state.pool()).remove(user.id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/cart
async fn clear(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<StatusCode> {
    CartService::new(state.pool()).clear(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Merge the guest cart kept by the client. The client should drop its copy
/// when `clear_local` is set.
///
/// POST /api/cart/sync
async fn sync(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CartSync>,
) -> Result<Json<CartView>> {
    let items = CartService::new(state.pool())
        .sync(user.id, &body.lines)
        .await?;
    Ok(Json(CartView::new(items, true)))
}
