//! Catalogue routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use mayombe_core::ProductId;

use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{
    NewProduct, NewRating, Product, ProductDetail, ProductQuery, ProductUpdate, Rating,
};
use crate::services::CatalogService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search).post(create))
        .route("/{id}", get(show).put(update).delete(deactivate))
        .route("/{id}/ratings", get(ratings).post(rate))
}

/// GET /api/products?q=&category=&min_price=&max_price=&seller_id=&sort=&limit=&offset=
async fn search(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(CatalogService::new(&state).search(&query).await?))
}

/// GET /api/products/{id}
async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let detail = CatalogService::new(&state)
        .detail(id, user.as_ref())
        .await?;
    Ok(Json(detail))
}

/// POST /api/products
async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<NewProduct>,
) -> Result<impl IntoResponse> {
    let product = CatalogService::new(&state).create(&user, body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    Ok(Json(CatalogService::new(&state).update(&user, id, body).await?))
}

/// DELETE /api/products/{id}
async fn deactivate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    CatalogService::new(&state).deactivate(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/products/{id}/ratings
async fn ratings(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Rating>>> {
    Ok(Json(CatalogService::new(&state).ratings(id).await?))
}

/// POST /api/products/{id}/ratings
async fn rate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Json(body): Json<NewRating>,
) -> Result<Json<Rating>> {
    Ok(Json(CatalogService::new(&state).rate(&user, id, &body).await?))
}
