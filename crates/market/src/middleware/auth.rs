//! Authentication extractors.
//!
//! The session holds the profile ID signed in with. Each request reloads the
//! profile, so a role change or a deleted account applies immediately.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::db::ProfileRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, Profile, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Bonjour, {}", user.full_name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor that optionally gets the signed-in user.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts, state).await?))
    }
}

async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    let Some(stored) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
    else {
        return Ok(None);
    };

    let profile = ProfileRepository::new(state.pool())
        .get_by_id(stored.id)
        .await?;
    let user = refreshed(profile.as_ref());
    if user.is_none() {
        tracing::info!(user_id = %stored.id, "Session names a deleted profile; signing out");
        if let Err(e) = session.flush().await {
            tracing::warn!(error = %e, "Failed to drop stale session");
        }
    }
    Ok(user)
}

/// The identity to act as: the stored profile as it is now, if it still exists.
fn refreshed(profile: Option<&Profile>) -> Option<CurrentUser> {
    profile.map(CurrentUser::from)
}

/// Store the signed-in user in the session.
///
/// The session ID is cycled first so a pre-login session cannot be fixed.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Sign out: drop the whole session.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mayombe_core::{Email, Role, UserId};

    use super::*;

    fn profile(role: Role) -> Profile {
        Profile {
            id: UserId::new(4),
            email: Email::parse("ama@example.cg").expect("valid email"),
            full_name: "Ama Nkounkou".to_string(),
            phone: None,
            address: None,
            city: None,
            role,
            loyalty_points: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_demoted_admin_loses_admin_rights() {
        let user = refreshed(Some(&profile(Role::Buyer))).expect("profile exists");
        assert_eq!(user.role, Role::Buyer);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_promotion_applies_without_new_sign_in() {
        let user = refreshed(Some(&profile(Role::Admin))).expect("profile exists");
        assert!(user.is_admin());
    }

    #[test]
    fn test_deleted_profile_is_signed_out() {
        assert!(refreshed(None).is_none());
    }
}
