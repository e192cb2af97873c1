//! # Organization Repository
//!
//! Organizations (tenants), their inventory settings and their plan tier.
//!
//! An organization and its settings row are created together in one
//! transaction, so every organization the engine sees has settings.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use clinicstock_core::validation::{validate_name, validate_non_negative, validate_warning_days};
use clinicstock_core::{InventorySettings, Organization, PlanTier};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: SqlitePool,
}

impl OrganizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrganizationRepository { pool }
    }

    /// Creates an organization with the default inventory settings.
    pub async fn create(&self, name: &str, plan: PlanTier) -> DbResult<Organization> {
        self.create_with_settings(name, plan, InventorySettings::defaults(""))
            .await
    }

    /// Creates an organization whose settings start from `template`.
    ///
    /// `template.organization_id` is ignored and replaced by the new id.
    pub async fn create_with_settings(
        &self,
        name: &str,
        plan: PlanTier,
        template: InventorySettings,
    ) -> DbResult<Organization> {
        validate_name("name", name)?;

        let org = Organization {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            plan_tier: plan.as_str().to_string(),
            created_at: Utc::now(),
        };
        let settings = InventorySettings {
            organization_id: org.id.clone(),
            ..template
        };
        validate_settings(&settings)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, plan_tier, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&org.id)
        .bind(&org.name)
        .bind(&org.plan_tier)
        .bind(org.created_at)
        .execute(&mut *tx)
        .await?;

        write_settings(&mut *tx, &settings).await?;

        tx.commit().await?;

        info!(organization_id = %org.id, plan = %plan, "Organization created");
        Ok(org)
    }

    /// Gets an organization by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Organization))` - Found
    /// * `Ok(None)` - No such organization
    pub async fn get(&self, id: &str) -> DbResult<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, plan_tier, created_at
            FROM organizations
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(org)
    }

    /// Number of organizations in the database.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organizations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Changes the subscription tier.
    ///
    /// Downgrading never deletes data; existing records above the new caps
    /// stay, only further inserts are refused.
    pub async fn update_plan(&self, id: &str, plan: PlanTier) -> DbResult<()> {
        debug!(organization_id = %id, plan = %plan, "Updating plan tier");

        let result = sqlx::query("UPDATE organizations SET plan_tier = ?2 WHERE id = ?1")
            .bind(id)
            .bind(plan.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Organization", id));
        }

        Ok(())
    }

    /// Loads the settings row.
    ///
    /// ## Returns
    /// * `Ok(Some(settings))` - Row exists (fields may still be NULL)
    /// * `Ok(None)` - No row for this organization
    pub async fn get_settings(&self, organization_id: &str) -> DbResult<Option<InventorySettings>> {
        load_settings(&self.pool, organization_id).await
    }

    /// Inserts or replaces the settings row.
    pub async fn upsert_settings(&self, settings: &InventorySettings) -> DbResult<()> {
        validate_settings(settings)?;

        if self.get(&settings.organization_id).await?.is_none() {
            return Err(DbError::not_found(
                "Organization",
                &settings.organization_id,
            ));
        }

        write_settings(&self.pool, settings).await?;

        debug!(organization_id = %settings.organization_id, "Settings saved");
        Ok(())
    }
}

fn validate_settings(settings: &InventorySettings) -> DbResult<()> {
    if let Some(days) = settings.expiration_warning_days {
        validate_warning_days(days)?;
    }
    if let Some(threshold) = settings.low_stock_threshold {
        validate_non_negative("low_stock_threshold", threshold)?;
    }
    Ok(())
}

async fn write_settings<'e, E>(executor: E, settings: &InventorySettings) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO inventory_settings (
            organization_id, expiration_warning_days, low_stock_threshold,
            threshold_policy, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (organization_id) DO UPDATE SET
            expiration_warning_days = excluded.expiration_warning_days,
            low_stock_threshold = excluded.low_stock_threshold,
            threshold_policy = excluded.threshold_policy,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&settings.organization_id)
    .bind(settings.expiration_warning_days)
    .bind(settings.low_stock_threshold)
    .bind(settings.threshold_policy)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn load_settings<'e, E>(
    executor: E,
    organization_id: &str,
) -> DbResult<Option<InventorySettings>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let settings = sqlx::query_as::<_, InventorySettings>(
        r#"
        SELECT organization_id, expiration_warning_days, low_stock_threshold, threshold_policy
        FROM inventory_settings
        WHERE organization_id = ?1
        "#,
    )
    .bind(organization_id)
    .fetch_optional(executor)
    .await?;

    Ok(settings)
}

/// Loads and parses an organization's plan tier.
///
/// Unknown organizations are `NotFound`; an unparseable stored tier is a
/// data integrity error.
pub(crate) async fn load_plan<'e, E>(executor: E, organization_id: &str) -> DbResult<PlanTier>
where
    E: Executor<'e, Database = Sqlite>,
{
    let stored: Option<String> =
        sqlx::query_scalar("SELECT plan_tier FROM organizations WHERE id = ?1")
            .bind(organization_id)
            .fetch_optional(executor)
            .await?;

    let stored = stored.ok_or_else(|| DbError::not_found("Organization", organization_id))?;
    Ok(stored.parse::<PlanTier>()?)
}

// =============================================================================
// Unit Tests
// =============================================================================
