//! Account registration and sign-in.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use mayombe_core::Role;
use mayombe_core::cart::CartLine;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CartItem, CartView, CurrentUser, Profile};
use crate::services::{AuthService, CartService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Registration body. Only `buyer` and `vendor` may be chosen here.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Sign-in body. `local_cart` is the guest cart kept by the client.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub local_cart: Vec<CartLine>,
}

/// Sign-in response. `cart` is present when a guest cart was merged; when it
/// is absent the client keeps its guest cart and may retry `POST /api/cart/sync`.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub profile: Profile,
    pub cart: Option<CartView>,
}

fn session_error(e: &tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

async fn sign_in(session: &Session, profile: &Profile) -> Result<()> {
    set_current_user(session, &CurrentUser::from(profile))
        .await
        .map_err(|e| session_error(&e))?;
    set_sentry_user(&profile.id, Some(profile.email.as_str()));
    Ok(())
}

/// Create an account and sign in.
///
/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let profile = AuthService::new(state.pool())
        .register(
            &body.email,
            &body.password,
            &body.full_name,
            body.role.unwrap_or_default(),
        )
        .await?;

    sign_in(&session, &profile).await?;
    tracing::info!(user_id = %profile.id, role = %profile.role, "Account registered");

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Sign in and merge the guest cart into the server cart.
///
/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let profile = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    sign_in(&session, &profile).await?;
    tracing::info!(user_id = %profile.id, "Signed in");

    let cart = if body.local_cart.is_empty() {
        None
    } else {
        merged_cart(
            CartService::new(state.pool())
                .sync(profile.id, &body.local_cart)
                .await,
        )
    };

    Ok(Json(LoginResponse { profile, cart }))
}

/// The session is already written, so a failed merge must not fail the login.
fn merged_cart(result: Result<Vec<CartItem>>) -> Option<CartView> {
    match result {
        Ok(items) => Some(CartView::new(items, true)),
        Err(e) => {
            tracing::warn!(error = %e, "Guest cart merge failed at sign-in");
            None
        }
    }
}

/// Sign out.
///
/// POST /api/auth/logout
async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user as stored in the session.
///
/// GET /api/auth/me
async fn me(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mayombe_core::{CartItemId, ProductId};

    use super::*;

    #[test]
    fn test_failed_merge_keeps_login() {
        assert!(merged_cart(Err(AppError::Internal("pool closed".into()))).is_none());
    }

    #[test]
    fn test_merged_cart_clears_local_copy() {
        let item = CartItem {
            id: CartItemId::new(1),
            product_id: ProductId::new(7),
            quantity: 2,
            size: None,
            color: None,
            added_at: Utc::now(),
        };
        let view = merged_cart(Ok(vec![item])).expect("merged");
        assert!(view.clear_local);
        assert_eq!(view.item_count, 2);
    }
}
