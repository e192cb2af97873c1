//! # Catalog Repositories
//!
//! Categories and storage locations. Both are small per-organization lookup
//! tables that items point at.
//!
//! ```text
//! categories ◄──── inventory_items.category_id   (ON DELETE SET NULL)
//! locations  ◄──── inventory_items.location_id   (ON DELETE RESTRICT)
//! ```
//!
//! Deleting a category leaves its items uncategorized. A location that still
//! holds stock cannot be deleted until the stock is moved.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use clinicstock_core::validation::validate_name;
use clinicstock_core::{check_capacity, Category, Location, Resource};

use super::{begin_write, count_for_organization};
use super::organization::load_plan;
use crate::error::{DbError, DbResult};

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Name already used in this organization
    pub async fn insert(&self, organization_id: &str, name: &str) -> DbResult<Category> {
        validate_name("name", name)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(organization_id = %organization_id, name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, organization_id, name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&category.id)
        .bind(&category.organization_id)
        .bind(&category.name)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &category.name),
            other => other,
        })?;

        Ok(category)
    }

    /// Lists categories sorted by name.
    pub async fn list(&self, organization_id: &str) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, organization_id, name, created_at
            FROM categories
            WHERE organization_id = ?1
            ORDER BY name
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Deletes a category. Items in it become uncategorized.
    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1 AND organization_id = ?2")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

// =============================================================================
// Locations
// =============================================================================

#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// Inserts a location, enforcing the plan's location cap.
    ///
    /// ## Returns
    /// * `Err(DbError::Core(CoreError::Plan(_)))` - Cap reached
    /// * `Err(DbError::UniqueViolation)` - Name already used in this organization
    pub async fn insert(
        &self,
        organization_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<Location> {
        validate_name("name", name)?;

        let location = Location {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            name: name.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            created_at: Utc::now(),
        };

        let mut tx = begin_write(&self.pool).await?;

        let plan = load_plan(&mut *tx, organization_id).await?;
        let current = count_for_organization(&mut *tx, "locations", organization_id).await?;
        check_capacity(plan, Resource::Locations, current)?;

        debug!(
            organization_id = %organization_id,
            name = %location.name,
            current,
            "Inserting location"
        );

        sqlx::query(
            r#"
            INSERT INTO locations (id, organization_id, name, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&location.id)
        .bind(&location.organization_id)
        .bind(&location.name)
        .bind(&location.description)
        .bind(location.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &location.name),
            other => other,
        })?;

        tx.commit().await?;

        Ok(location)
    }

    /// Lists locations sorted by name.
    pub async fn list(&self, organization_id: &str) -> DbResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, organization_id, name, description, created_at
            FROM locations
            WHERE organization_id = ?1
            ORDER BY name
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    /// Deletes an empty location.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Items are still stored there
    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM locations WHERE id = ?1 AND organization_id = ?2")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Location", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
