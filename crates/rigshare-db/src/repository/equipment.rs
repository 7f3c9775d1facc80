//! # Equipment Repository
//!
//! Database operations for rentable listings.
//!
//! ## Owner Names
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  equipment                          users                               │
//! │  ┌──────────┬──────────┐            ┌──────────┬────────────┐           │
//! │  │ id       │ owner_id │───────────►│ id       │ name       │           │
//! │  └──────────┴──────────┘            └──────────┴────────────┘           │
//! │                                                                         │
//! │  No name is stored on the equipment row. Every read JOINs users, so     │
//! │  ownerName always reflects the owner's current profile.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ownership is not checked here; handlers compare `owner_id` before
//! calling the mutating methods.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use rigshare_core::{generate_id, DeliveryOptions, Equipment, EquipmentPatch, NewEquipment};

const SELECT_EQUIPMENT: &str = r#"
    SELECT
        e.id,
        e.name,
        e.description,
        e.price_cents,
        e.category,
        e.location,
        e.image,
        e.owner_id,
        COALESCE(u.name, '') AS owner_name,
        e.pickup,
        e.delivery,
        e.shipping,
        e.created_at,
        e.updated_at
    FROM equipment e
    LEFT JOIN users u ON u.id = e.owner_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct EquipmentRow {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    category: String,
    location: String,
    image: Option<String>,
    owner_id: String,
    owner_name: String,
    pickup: bool,
    delivery: bool,
    shipping: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EquipmentRow> for Equipment {
    fn from(row: EquipmentRow) -> Self {
        Equipment {
            id: row.id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            category: row.category,
            location: row.location,
            image: row.image,
            owner_id: row.owner_id,
            owner_name: row.owner_name,
            delivery_options: DeliveryOptions {
                pickup: row.pickup,
                delivery: row.delivery,
                shipping: row.shipping,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for equipment database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.equipment();
/// let all = repo.list().await?;
/// let mine = repo.list_by_owner(&user_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct EquipmentRepository {
    pool: SqlitePool,
}

impl EquipmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EquipmentRepository { pool }
    }

    /// Lists every listing in creation order.
    pub async fn list(&self) -> DbResult<Vec<Equipment>> {
        let sql = format!("{SELECT_EQUIPMENT} ORDER BY e.created_at, e.id");
        let rows = sqlx::query_as::<_, EquipmentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed equipment");
        Ok(rows.into_iter().map(Equipment::from).collect())
    }

    /// Lists one owner's listings in creation order.
    pub async fn list_by_owner(&self, owner_id: &str) -> DbResult<Vec<Equipment>> {
        let sql = format!("{SELECT_EQUIPMENT} WHERE e.owner_id = ?1 ORDER BY e.created_at, e.id");
        let rows = sqlx::query_as::<_, EquipmentRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Equipment::from).collect())
    }

    /// Gets a listing by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Equipment>> {
        let sql = format!("{SELECT_EQUIPMENT} WHERE e.id = ?1");
        let row = sqlx::query_as::<_, EquipmentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Equipment::from))
    }

    /// Inserts a listing for `owner_id` and returns it with the owner's
    /// current name.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - owner does not exist
    pub async fn create(&self, new: &NewEquipment, owner_id: &str) -> DbResult<Equipment> {
        let new = new.clone().trimmed();
        let id = generate_id();
        let now = Utc::now();

        debug!(%id, owner_id, "Inserting equipment");

        sqlx::query(
            r#"
            INSERT INTO equipment (
                id, name, description, price_cents, category, location, image,
                owner_id, pickup, delivery, shipping, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12, ?13
            )
            "#,
        )
        .bind(&id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price_cents)
        .bind(&new.category)
        .bind(&new.location)
        .bind(&new.image)
        .bind(owner_id)
        .bind(new.delivery_options.pickup)
        .bind(new.delivery_options.delivery)
        .bind(new.delivery_options.shipping)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Equipment", &id))
    }

    /// Applies a patch and returns the stored listing.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such listing
    pub async fn update(&self, id: &str, patch: &EquipmentPatch) -> DbResult<Equipment> {
        let mut equipment = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Equipment", id))?;
        patch.apply_to(&mut equipment);
        equipment.updated_at = Utc::now();

        debug!(id, "Updating equipment");

        let result = sqlx::query(
            r#"
            UPDATE equipment SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                category = ?5,
                location = ?6,
                image = ?7,
                pickup = ?8,
                delivery = ?9,
                shipping = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&equipment.id)
        .bind(&equipment.name)
        .bind(&equipment.description)
        .bind(equipment.price_cents)
        .bind(&equipment.category)
        .bind(&equipment.location)
        .bind(&equipment.image)
        .bind(equipment.delivery_options.pickup)
        .bind(equipment.delivery_options.delivery)
        .bind(equipment.delivery_options.shipping)
        .bind(equipment.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Equipment", id));
        }

        Ok(equipment)
    }

    /// Replaces the listing image.
    pub async fn set_image(&self, id: &str, image: &str) -> DbResult<Equipment> {
        debug!(id, "Setting equipment image");

        let result = sqlx::query("UPDATE equipment SET image = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(image)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Equipment", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Equipment", id))
    }

    /// Deletes a listing. Nothing else references equipment rows.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id, "Deleting equipment");

        let result = sqlx::query("DELETE FROM equipment WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Equipment", id));
        }

        Ok(())
    }

    /// Counts listings (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
