//! # User Repository
//!
//! Accounts and public profiles.
//!
//! The `password_hash` column is written here and read only by
//! [`UserRepository::verify_credentials`]; every profile query selects the
//! public columns explicitly, so a hash never leaves this module.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use rigshare_core::{generate_id, ProfileUpdate, UserProfile};

const PROFILE_COLUMNS: &str =
    "id, name, email, phone, location, bio, avatar, created_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            location: row.location,
            bio: row.bio,
            avatar: row.avatar,
            created_at: row.created_at,
        }
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account. The password is stored as an argon2 hash.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn create(&self, name: &str, email: &str, password: &str) -> DbResult<UserProfile> {
        let profile = UserProfile {
            id: generate_id(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            phone: None,
            location: None,
            bio: None,
            avatar: None,
            created_at: Utc::now(),
        };
        let password_hash = hash_password(password)?;

        debug!(id = %profile.id, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&password_hash)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &profile.email),
            other => other,
        })?;

        Ok(profile)
    }

    /// Gets a profile by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserProfile::from))
    }

    /// Gets a profile by email.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE email = ?1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserProfile::from))
    }

    /// Lists every profile, oldest first.
    pub async fn list(&self) -> DbResult<Vec<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    /// Applies a profile update and returns the stored profile.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such user
    /// * `Err(DbError::UniqueViolation)` - new email already taken
    pub async fn update(&self, id: &str, update: &ProfileUpdate) -> DbResult<UserProfile> {
        let mut profile = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;
        update.apply_to(&mut profile);

        debug!(id, "Updating user profile");

        sqlx::query(
            r#"
            UPDATE users SET
                name = ?2,
                email = ?3,
                phone = ?4,
                location = ?5,
                bio = ?6,
                avatar = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.location)
        .bind(&profile.bio)
        .bind(&profile.avatar)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &profile.email),
            other => other,
        })?;

        Ok(profile)
    }

    /// Checks an email/password pair. Unknown emails and wrong passwords
    /// both yield `None`.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> DbResult<Option<UserProfile>> {
        let stored: Option<(String, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?1")
                .bind(email.trim())
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, hash)) = stored else {
            return Ok(None);
        };
        if !verify_password(password, &hash) {
            debug!(%id, "Password mismatch");
            return Ok(None);
        }
        self.get(&id).await
    }

    /// Counts accounts (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
