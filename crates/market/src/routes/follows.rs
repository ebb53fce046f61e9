//! Seller follows.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use mayombe_core::{Role, UserId};

use crate::db::{FollowRepository, ProfileRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::SellerSummary;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follows", get(list))
        .route("/follows/{seller_id}", post(follow).delete(unfollow))
        .route("/sellers/{id}/followers", get(followers))
}

/// Follower count of a seller.
#[derive(Debug, Serialize)]
pub struct FollowerCount {
    pub seller_id: UserId,
    pub followers: i64,
}

/// GET /api/follows
async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<SellerSummary>>> {
    let sellers = FollowRepository::new(state.pool())
        .followed_by(user.id)
        .await?;
    Ok(Json(sellers))
}

/// POST /api/follows/{seller_id}
async fn follow(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(seller_id): Path<UserId>,
) -> Result<StatusCode> {
    if seller_id == user.id {
        return Err(AppError::BadRequest("You cannot follow yourself".to_string()));
    }
    ensure_seller(&state, seller_id).await?;

    FollowRepository::new(state.pool())
        .follow(user.id, seller_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/follows/{seller_id}
async fn unfollow(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(seller_id): Path<UserId>,
) -> Result<StatusCode> {
    FollowRepository::new(state.pool())
        .unfollow(user.id, seller_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sellers/{id}/followers
async fn followers(
    State(state): State<AppState>,
    Path(seller_id): Path<UserId>,
) -> Result<Json<FollowerCount>> {
    ensure_seller(&state, seller_id).await?;
    let followers = FollowRepository::new(state.pool())
        .follower_count(seller_id)
        .await?;
    Ok(Json(FollowerCount {
        seller_id,
        followers,
    }))
}

async fn ensure_seller(state: &AppState, id: UserId) -> Result<()> {
    ProfileRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .filter(|p| p.role == Role::Vendor)
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Seller".to_string()))
}
