//! Own profile.

use axum::{Json, Router, extract::State, routing::get};

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Profile, ProfileUpdate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show).put(update))
}

/// GET /api/profile
async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Profile>> {
    let profile = ProfileRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;
    Ok(Json(profile))
}

/// PUT /api/profile
async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let update = body
        .normalized()
        .map_err(|msg| AppError::BadRequest(msg.to_string()))?;
    let profile = ProfileRepository::new(state.pool())
        .update(user.id, &update)
        .await?;
    Ok(Json(profile))
}
