//! Account management commands.
//!
//! Registration through the API only offers the buyer and vendor roles;
//! logisticians and admins are created or promoted here.

use mayombe_core::{Email, Role};
use mayombe_market::db::ProfileRepository;
use mayombe_market::services::AuthService;

use super::{CommandError, connect};

fn parse_role(role: &str) -> Result<Role, CommandError> {
    role.parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))
}

/// Create an account with any role. Returns the new profile ID.
pub async fn create(email: &str, name: &str, role: &str, password: &str) -> Result<i32, CommandError> {
    let role = parse_role(role)?;
    let pool = connect().await?;

    tracing::info!("Creating account: {} ({})", email, role);
    let profile = AuthService::new(&pool)
        .create_account(email, password, name, role)
        .await?;

    tracing::info!(
        "Account created! ID: {}, Email: {}, Role: {}",
        profile.id,
        profile.email,
        profile.role
    );
    Ok(profile.id.as_i32())
}

/// Change the role of the account registered under `email`.
///
/// Takes effect at the user's next sign-in.
pub async fn set_role(email: &str, role: &str) -> Result<(), CommandError> {
    let role = parse_role(role)?;
    let parsed = Email::parse(email).map_err(|_| CommandError::UnknownUser(email.to_owned()))?;
    let pool = connect().await?;

    let profiles = ProfileRepository::new(&pool);
    let profile = profiles
        .get_by_email(&parsed)
        .await?
        .ok_or_else(|| CommandError::UnknownUser(email.to_owned()))?;

    let updated = profiles.set_role(profile.id, role).await?;
    tracing::info!("{} is now {}", updated.email, updated.role);
    Ok(())
}
