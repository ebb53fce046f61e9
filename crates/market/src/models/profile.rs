//! Profile domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mayombe_core::{Email, Role, UserId};

/// A marketplace account.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub role: Role,
    /// Earned on delivered orders.
    pub loyalty_points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

impl ProfileUpdate {
    /// Trim every field; a blank name is refused.
    ///
    /// # Errors
    ///
    /// Returns a message when `full_name` is present but blank.
    pub fn normalized(self) -> Result<Self, &'static str> {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_owned());
        let full_name = trim(self.full_name);
        if full_name.as_deref().is_some_and(str::is_empty) {
            return Err("full name cannot be blank");
        }
        Ok(Self {
            full_name,
            phone: trim(self.phone),
            address: trim(self.address),
            city: trim(self.city),
        })
    }
}

/// A seller as shown in follow lists.
#[derive(Debug, Clone, Serialize)]
pub struct SellerSummary {
    pub id: UserId,
    pub full_name: String,
    pub city: Option<String>,
    pub followed_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_normalized() {
        let update = ProfileUpdate {
            full_name: Some("  Mireille Nkounkou ".to_string()),
            city: Some(" Pointe-Noire".to_string()),
            ..ProfileUpdate::default()
        }
        .normalized()
        .unwrap();

        assert_eq!(update.full_name.as_deref(), Some("Mireille Nkounkou"));
        assert_eq!(update.city.as_deref(), Some("Pointe-Noire"));
        assert_eq!(update.phone, None);
    }

    #[test]
    fn test_profile_update_rejects_blank_name() {
        let update = ProfileUpdate {
            full_name: Some("   ".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(update.normalized().is_err());
    }
}
