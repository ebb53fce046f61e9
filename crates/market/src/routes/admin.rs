//! Administration routes. Every handler requires the admin role.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use serde::Deserialize;

use mayombe_core::{OrderId, Role, UserId};

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Order, Profile};
use crate::services::OrderService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/release-payout", post(release_payout))
        .route("/profiles/{id}/role", put(set_role))
}

/// Body of `PUT /api/admin/profiles/{id}/role`.
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

fn require_admin(user: &CurrentUser) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// POST /api/admin/orders/{id}/release-payout
async fn release_payout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(
        OrderService::new(&state).release_payout(&user, id).await?,
    ))
}

/// The new role applies from the user's next request.
///
/// PUT /api/admin/profiles/{id}/role
async fn set_role(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<UserId>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<Profile>> {
    require_admin(&user)?;
    let profile = ProfileRepository::new(state.pool())
        .set_role(id, body.role)
        .await?;
    tracing::info!(admin_id = %user.id, user_id = %id, role = %body.role, "Role changed");
    Ok(Json(profile))
}
