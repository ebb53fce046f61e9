//! Profile repository: accounts, password hashes, roles.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mayombe_core::{Email, Role, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Profile, ProfileUpdate};

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: UserId,
    email: String,
    full_name: String,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    role: Role,
    loyalty_points: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(r: ProfileRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: r.id,
            email,
            full_name: r.full_name,
            phone: r.phone,
            address: r.address,
            city: r.city,
            role: r.role,
            loyalty_points: r.loyalty_points,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileWithHashRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    password_hash: String,
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT id, email, full_name, phone, address, city, role,
                   loyalty_points, created_at, updated_at
            FROM market.profile
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Profile::try_from)
        .transpose()
    }

    /// Get a profile by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Profile>, RepositoryError> {
        sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT id, email, full_name, phone, address, city, role,
                   loyalty_points, created_at, updated_at
            FROM market.profile
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?
        .map(Profile::try_from)
        .transpose()
    }

    /// Create a profile together with its password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_with_password(
        &self,
        email: &Email,
        full_name: &str,
        role: Role,
        password_hash: &str,
    ) -> Result<Profile, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO market.profile (email, full_name, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, full_name, phone, address, city, role,
                      loyalty_points, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(full_name)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique("email already exists"))?;

        sqlx::query(
            r"
            INSERT INTO market.profile_password (profile_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(row.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Get a profile and its password hash for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Profile, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileWithHashRow>(
            r"
            SELECT p.id, p.email, p.full_name, p.phone, p.address, p.city, p.role,
                   p.loyalty_points, p.created_at, p.updated_at, pw.password_hash
            FROM market.profile p
            JOIN market.profile_password pw ON pw.profile_id = p.id
            WHERE p.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((r.profile.try_into()?, r.password_hash)))
            .transpose()
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn update(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        sqlx::query_as::<_, ProfileRow>(
            r"
            UPDATE market.profile
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                city = COALESCE($5, city),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, full_name, phone, address, city, role,
                      loyalty_points, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.full_name.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.address.as_deref())
        .bind(update.city.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Change a profile's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn set_role(&self, id: UserId, role: Role) -> Result<Profile, RepositoryError> {
        sqlx::query_as::<_, ProfileRow>(
            r"
            UPDATE market.profile
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, full_name, phone, address, city, role,
                      loyalty_points, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Emails of the given profiles, for notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn emails(&self, ids: &[UserId]) -> Result<Vec<(UserId, String)>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(UserId::as_i32).collect();
        let rows = sqlx::query_as::<_, (UserId, String)>(
            "SELECT id, email FROM market.profile WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
