//! # Inventory Report Service
//!
//! Runs the status engine over stored records.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Report Flow                                      │
//! │                                                                         │
//! │  overview / waste / alerts (org_id, now)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load plan + settings + items  (one read transaction)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  clinicstock_core::classify_all(items, settings, now)                  │
//! │       │                                                                 │
//! │       ├──► summarize / summarize_by      → InventoryOverview           │
//! │       ├──► waste_report  (plan-gated)    → WasteReport                 │
//! │       └──► build_alerts  (expiry gated)  → Vec<Alert>                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `now` is always supplied by the caller. A single bad record fails the
//! whole report with a data integrity error; nothing partial is returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use clinicstock_core::{
    build_alerts, classify_all, require_feature, summarize, summarize_by, waste_report, Alert,
    DataIntegrityError, Feature, InventoryItem, InventorySettings, InventorySummary,
    ItemWithStatus, PlanTier, WasteReport,
};

use crate::error::{DbError, DbResult};
use crate::repository::organization::{load_plan, load_settings};

/// Group key for items with no category or location.
pub const UNASSIGNED: &str = "unassigned";

/// Dashboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryOverview {
    pub items: Vec<ItemWithStatus>,
    pub summary: InventorySummary,
    /// Keyed by category id, or [`UNASSIGNED`].
    pub by_category: BTreeMap<String, InventorySummary>,
    /// Keyed by location id, or [`UNASSIGNED`]. Only on tiers with
    /// multi-location reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_location: Option<BTreeMap<String, InventorySummary>>,
}

/// Everything a report needs, loaded in one transaction.
struct Snapshot {
    plan: PlanTier,
    classified: Vec<ItemWithStatus>,
}

#[derive(Debug, Clone)]
pub struct InventoryReportService {
    pool: SqlitePool,
}

impl InventoryReportService {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryReportService { pool }
    }

    /// Items with their status plus aggregate counts.
    pub async fn overview(
        &self,
        organization_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<InventoryOverview> {
        let Snapshot { plan, classified } = self.snapshot(organization_id, now).await?;

        let summary = summarize(&classified);
        let by_category = summarize_by(&classified, |entry| {
            group_key(&entry.item.category_id)
        });
        let by_location = plan.has_feature(Feature::MultiLocation).then(|| {
            summarize_by(&classified, |entry| group_key(&entry.item.location_id))
        });

        info!(
            organization_id = %organization_id,
            total_items = summary.total_items,
            needs_attention = summary.attention_count(),
            "Built inventory overview"
        );

        Ok(InventoryOverview {
            items: classified,
            summary,
            by_category,
            by_location,
        })
    }

    /// Value of stock that expired during the last `window_days` days.
    ///
    /// ## Returns
    /// * `Err(DbError::Core(CoreError::Plan(_)))` - Tier lacks waste reports
    /// * `Err(DbError::Core(CoreError::Validation(_)))` - Negative window
    pub async fn waste(
        &self,
        organization_id: &str,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> DbResult<WasteReport> {
        let plan = load_plan(&self.pool, organization_id).await?;
        require_feature(plan, Feature::WasteReports)?;

        let Snapshot { classified, .. } = self.snapshot(organization_id, now).await?;
        let report = waste_report(&classified, window_days, now)?;

        info!(
            organization_id = %organization_id,
            window_days,
            waste_count = report.waste_count,
            waste_cents = report.total_waste_value.cents(),
            "Built waste report"
        );

        Ok(report)
    }

    /// Notification records for items that need attention.
    ///
    /// Low stock alerts are produced on every tier. Expiry alerts are
    /// dropped unless the tier includes expiration alerts.
    pub async fn alerts(&self, organization_id: &str, now: DateTime<Utc>) -> DbResult<Vec<Alert>> {
        let Snapshot { plan, classified } = self.snapshot(organization_id, now).await?;

        let mut alerts = build_alerts(&classified, now);
        if !plan.has_feature(Feature::ExpirationAlerts) {
            let before = alerts.len();
            alerts.retain(|alert| !alert.kind.is_expiry());
            debug!(
                organization_id = %organization_id,
                dropped = before - alerts.len(),
                plan = %plan,
                "Expiry alerts not included in plan"
            );
        }

        Ok(alerts)
    }

    async fn snapshot(&self, organization_id: &str, now: DateTime<Utc>) -> DbResult<Snapshot> {
        let mut tx = self.pool.begin().await?;

        let plan = load_plan(&mut *tx, organization_id).await?;

        let settings: InventorySettings = load_settings(&mut *tx, organization_id)
            .await?
            .ok_or_else(|| {
                DataIntegrityError::missing("organization", "inventory_settings", organization_id)
            })?;

        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT
                id, organization_id, name, sku, category_id, location_id, lot_number,
                quantity, unit_cost_cents, expiration_date, reorder_threshold,
                created_at, updated_at
            FROM inventory_items
            WHERE organization_id = ?1
            ORDER BY expiration_date IS NULL, expiration_date, name, id
            "#,
        )
        .bind(organization_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(DbError::loading("item"))?;

        tx.commit().await?;

        let classified = classify_all(&items, &settings, now).map_err(|err| {
            warn!(organization_id = %organization_id, error = %err, "Inventory data rejected");
            err
        })?;

        Ok(Snapshot { plan, classified })
    }
}

fn group_key(id: &Option<String>) -> String {
    id.clone().unwrap_or_else(|| UNASSIGNED.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::test_support::db_with_org;
    use chrono::{Duration, NaiveDate, TimeZone};
    use clinicstock_core::{
        AlertKind, CoreError, ItemStatus, NewItem, PlanError, ThresholdPolicy,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap()
    }

    fn day(offset: i64) -> NaiveDate {
        (now() + Duration::days(offset)).date_naive()
    }

    fn input(name: &str, quantity: i64, cost: &str, expires_in: i64) -> NewItem {
        NewItem {
            name: name.to_string(),
            sku: None,
            category_id: None,
            location_id: None,
            lot_number: None,
            quantity,
            unit_cost: cost.to_string(),
            expiration_date: day(expires_in),
            reorder_threshold: None,
        }
    }

    /// Clinic with one item in each status.
    async fn seeded(plan: PlanTier) -> (Database, String) {
        let (db, org_id) = db_with_org(plan).await;
        let items = db.items();

        items
            .insert(&org_id, &input("Expired filler", 2, "100.00", -10))
            .await
            .unwrap();
        items
            .insert(&org_id, &input("Botox 100U", 40, "45.00", 12))
            .await
            .unwrap();
        items
            .insert(&org_id, &input("Gauze pads", 3, "0.50", 300))
            .await
            .unwrap();
        items
            .insert(&org_id, &input("Gloves", 200, "0.10", 400))
            .await
            .unwrap();

        (db, org_id)
    }

    #[tokio::test]
    async fn test_overview_classifies_and_summarizes() {
        let (db, org_id) = seeded(PlanTier::Free).await;

        let overview = db.reports().overview(&org_id, now()).await.unwrap();

        let statuses: Vec<(String, ItemStatus)> = overview
            .items
            .iter()
            .map(|e| (e.item.name.clone(), e.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("Expired filler".to_string(), ItemStatus::Expired),
                ("Botox 100U".to_string(), ItemStatus::ExpiringSoon),
                ("Gauze pads".to_string(), ItemStatus::LowStock),
                ("Gloves".to_string(), ItemStatus::Ok),
            ]
        );

        let summary = overview.summary;
        assert_eq!(summary.total_items, 4);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.expiring_soon, 1);
        assert_eq!(summary.low_stock, 1);
        // 200.00 + 1800.00 + 1.50 + 20.00
        assert_eq!(summary.total_value.cents(), 202_150);

        assert_eq!(overview.by_category.len(), 1);
        assert_eq!(overview.by_category[UNASSIGNED], summary);
        // Free tier has no per-location breakdown
        assert!(overview.by_location.is_none());
    }

    #[tokio::test]
    async fn test_overview_groups_by_location_on_paid_tier() {
        let (db, org_id) = seeded(PlanTier::Starter).await;
        let fridge = db
            .locations()
            .insert(&org_id, "Main fridge", None)
            .await
            .unwrap();

        let mut vial = input("Sculptra", 5, "300.00", 90);
        vial.location_id = Some(fridge.id.clone());
        vial.reorder_threshold = Some(2);
        db.items().insert(&org_id, &vial).await.unwrap();

        let overview = db.reports().overview(&org_id, now()).await.unwrap();
        let by_location = overview.by_location.unwrap();

        assert_eq!(by_location[&fridge.id].total_items, 1);
        assert_eq!(by_location[&fridge.id].total_value.cents(), 150_000);
        assert_eq!(by_location[UNASSIGNED].total_items, 4);
    }

    #[tokio::test]
    async fn test_overview_follows_settings() {
        let (db, org_id) = seeded(PlanTier::Free).await;

        db.organizations()
            .upsert_settings(&InventorySettings {
                organization_id: org_id.clone(),
                expiration_warning_days: Some(7),
                low_stock_threshold: Some(2),
                threshold_policy: ThresholdPolicy::Truthy,
            })
            .await
            .unwrap();

        let overview = db.reports().overview(&org_id, now()).await.unwrap();
        assert_eq!(overview.summary.expiring_soon, 0);
        assert_eq!(overview.summary.low_stock, 0);
        assert_eq!(overview.summary.expired, 1);
    }

    #[tokio::test]
    async fn test_missing_settings_field_fails_whole_report() {
        let (db, org_id) = seeded(PlanTier::Free).await;

        sqlx::query(
            "UPDATE inventory_settings SET expiration_warning_days = NULL WHERE organization_id = ?1",
        )
        .bind(&org_id)
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.reports().overview(&org_id, now()).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::DataIntegrity(DataIntegrityError::MissingField {
                field: "expiration_warning_days",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_item_without_expiration_fails_whole_report() {
        let (db, org_id) = seeded(PlanTier::Free).await;

        sqlx::query(
            "UPDATE inventory_items SET expiration_date = NULL \
             WHERE organization_id = ?1 AND name = 'Gloves'",
        )
        .bind(&org_id)
        .execute(db.pool())
        .await
        .unwrap();

        assert!(matches!(
            db.reports().overview(&org_id, now()).await,
            Err(DbError::Core(CoreError::DataIntegrity(_)))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_expiration_fails_whole_report() {
        let (db, org_id) = seeded(PlanTier::Free).await;

        sqlx::query(
            "UPDATE inventory_items SET expiration_date = 'not-a-date' \
             WHERE organization_id = ?1 AND name = 'Gauze pads'",
        )
        .bind(&org_id)
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.reports().overview(&org_id, now()).await.unwrap_err();
        match err {
            DbError::Core(CoreError::DataIntegrity(DataIntegrityError::Malformed {
                entity,
                field,
                ..
            })) => {
                assert_eq!(entity, "item");
                assert_eq!(field, "expiration_date");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_waste_requires_plan() {
        let (db, org_id) = seeded(PlanTier::Starter).await;

        let err = db.reports().waste(&org_id, 30, now()).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Plan(PlanError::FeatureUnavailable { .. }))
        ));
    }

    #[tokio::test]
    async fn test_waste_window() {
        let (db, org_id) = seeded(PlanTier::Professional).await;
        db.items()
            .insert(&org_id, &input("Old lidocaine", 10, "8.00", -40))
            .await
            .unwrap();

        let report = db.reports().waste(&org_id, 30, now()).await.unwrap();
        assert_eq!(report.waste_count, 1);
        assert_eq!(report.expired_items[0].item.name, "Expired filler");
        assert_eq!(report.total_waste_value.cents(), 20_000);

        let wide = db.reports().waste(&org_id, 60, now()).await.unwrap();
        assert_eq!(wide.waste_count, 2);
        assert_eq!(wide.total_waste_value.cents(), 28_000);

        assert!(matches!(
            db.reports().waste(&org_id, -1, now()).await,
            Err(DbError::Core(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_alerts_gated_by_plan() {
        let (db, org_id) = seeded(PlanTier::Free).await;

        let alerts = db.reports().alerts(&org_id, now()).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowStock);

        db.organizations()
            .update_plan(&org_id, PlanTier::Starter)
            .await
            .unwrap();

        let alerts = db.reports().alerts(&org_id, now()).await.unwrap();
        let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertKind::Expired, AlertKind::ExpiringSoon, AlertKind::LowStock]
        );
    }

    #[tokio::test]
    async fn test_reports_for_unknown_org() {
        let (db, _) = seeded(PlanTier::Free).await;
        assert!(matches!(
            db.reports().overview("missing", now()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_overview_serializes_camel_case() {
        let (db, org_id) = seeded(PlanTier::Free).await;
        let overview = db.reports().overview(&org_id, now()).await.unwrap();

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["summary"]["totalItems"], 4);
        assert_eq!(json["items"][0]["status"], "expired");
        assert_eq!(json["items"][0]["unitCost"], 100);
        assert_eq!(json["summary"]["totalValue"], 2021.5);
        assert!(json.get("byLocation").is_none());
    }
}
