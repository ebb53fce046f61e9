//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use mayombe_core::{Email, Role, UserId};

use super::Profile;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user. The
/// authentication extractors rebuild it from the profile on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Profile ID.
    pub id: UserId,
    /// Sign-in email address.
    pub email: Email,
    /// Display name.
    pub full_name: String,
    /// Marketplace role.
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

impl From<&Profile> for CurrentUser {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            role: profile.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
