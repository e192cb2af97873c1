//! # Item Repository
//!
//! Database operations for inventory items.
//!
//! ## Stock Adjustments
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Quantity Update Strategy                         │
//! │                                                                     │
//! │  Usage and restocking are recorded as deltas:                      │
//! │     adjust_quantity(org, item, -2)   2 syringes used               │
//! │     adjust_quantity(org, item, +50)  delivery arrived              │
//! │                                                                     │
//! │  Each delta is one UPDATE guarded by `quantity + delta >= 0`, so   │
//! │  two nurses recording usage at once both land and the shelf never  │
//! │  goes below zero.                                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status is never stored; see [`crate::report`].

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use clinicstock_core::validation::validate_new_item;
use clinicstock_core::{check_capacity, CoreError, InventoryItem, NewItem, Resource};

use super::{begin_write, count_for_organization};
use super::organization::load_plan;
use crate::error::{DbError, DbResult};

const ITEM_COLUMNS: &str = r#"
    id, organization_id, name, sku, category_id, location_id, lot_number,
    quantity, unit_cost_cents, expiration_date, reorder_threshold,
    created_at, updated_at
"#;

/// Repository for inventory item operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
/// let item = repo.insert(org_id, &new_item).await?;
/// let item = repo.adjust_quantity(org_id, &item.id, -1).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts a new item.
    ///
    /// ## What This Does
    /// 1. Validates the input and parses the unit cost
    /// 2. Checks that referenced category and location belong to the organization
    /// 3. Enforces the plan's item cap
    /// 4. Inserts
    ///
    /// ## Returns
    /// * `Err(DbError::Core(_))` - Validation or plan failure
    /// * `Err(DbError::NotFound)` - Category/location not in this organization
    /// * `Err(DbError::UniqueViolation)` - SKU already used in this organization
    pub async fn insert(&self, organization_id: &str, input: &NewItem) -> DbResult<InventoryItem> {
        let unit_cost = validate_new_item(input)?;
        let now = Utc::now();

        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            name: input.name.trim().to_string(),
            sku: clean(&input.sku),
            category_id: clean(&input.category_id),
            location_id: clean(&input.location_id),
            lot_number: clean(&input.lot_number),
            quantity: input.quantity,
            unit_cost_cents: unit_cost.cents(),
            expiration_date: Some(input.expiration_date),
            reorder_threshold: input.reorder_threshold,
            created_at: now,
            updated_at: now,
        };

        let mut tx = begin_write(&self.pool).await?;

        let plan = load_plan(&mut *tx, organization_id).await?;
        let current = count_for_organization(&mut *tx, "inventory_items", organization_id).await?;
        check_capacity(plan, Resource::Items, current)?;

        ensure_references(&mut tx, organization_id, &item).await?;

        debug!(organization_id = %organization_id, name = %item.name, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, organization_id, name, sku, category_id, location_id, lot_number,
                quantity, unit_cost_cents, expiration_date, reorder_threshold,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.organization_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.category_id)
        .bind(&item.location_id)
        .bind(&item.lot_number)
        .bind(item.quantity)
        .bind(item.unit_cost_cents)
        .bind(item.expiration_date)
        .bind(item.reorder_threshold)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| sku_conflict(e, &item.sku))?;

        tx.commit().await?;

        Ok(item)
    }

    /// Gets an item by id within an organization.
    pub async fn get(&self, organization_id: &str, id: &str) -> DbResult<Option<InventoryItem>> {
        fetch_item(&self.pool, organization_id, id).await
    }

    /// Lists all items, soonest expiry first.
    pub async fn list(&self, organization_id: &str) -> DbResult<Vec<InventoryItem>> {
        let sql = format!(
            "SELECT {} FROM inventory_items WHERE organization_id = ?1 \
             ORDER BY expiration_date IS NULL, expiration_date, name, id",
            ITEM_COLUMNS
        );

        let items = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::loading("item"))?;

        debug!(organization_id = %organization_id, count = items.len(), "Listed items");
        Ok(items)
    }

    /// Replaces an item's editable fields.
    pub async fn update(
        &self,
        organization_id: &str,
        id: &str,
        input: &NewItem,
    ) -> DbResult<InventoryItem> {
        let unit_cost = validate_new_item(input)?;

        let mut tx = begin_write(&self.pool).await?;

        let mut item = fetch_item(&mut *tx, organization_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))?;

        item.name = input.name.trim().to_string();
        item.sku = clean(&input.sku);
        item.category_id = clean(&input.category_id);
        item.location_id = clean(&input.location_id);
        item.lot_number = clean(&input.lot_number);
        item.quantity = input.quantity;
        item.unit_cost_cents = unit_cost.cents();
        item.expiration_date = Some(input.expiration_date);
        item.reorder_threshold = input.reorder_threshold;
        item.updated_at = Utc::now();

        ensure_references(&mut tx, organization_id, &item).await?;

        debug!(organization_id = %organization_id, item_id = %id, "Updating item");

        sqlx::query(
            r#"
            UPDATE inventory_items SET
                name = ?3,
                sku = ?4,
                category_id = ?5,
                location_id = ?6,
                lot_number = ?7,
                quantity = ?8,
                unit_cost_cents = ?9,
                expiration_date = ?10,
                reorder_threshold = ?11,
                updated_at = ?12
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(&item.id)
        .bind(&item.organization_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.category_id)
        .bind(&item.location_id)
        .bind(&item.lot_number)
        .bind(item.quantity)
        .bind(item.unit_cost_cents)
        .bind(item.expiration_date)
        .bind(item.reorder_threshold)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| sku_conflict(e, &item.sku))?;

        tx.commit().await?;

        Ok(item)
    }

    /// Applies a quantity delta (negative for usage, positive for restock).
    ///
    /// The change is a single guarded `UPDATE`, so concurrent adjustments
    /// serialize on SQLite's write lock and none is lost.
    ///
    /// ## Returns
    /// * `Ok(InventoryItem)` - Item with the new quantity
    /// * `Err(DbError::NotFound)` - No such item in this organization
    /// * `Err(DbError::Core(CoreError::InsufficientStock))` - Would go below zero
    pub async fn adjust_quantity(
        &self,
        organization_id: &str,
        id: &str,
        delta: i64,
    ) -> DbResult<InventoryItem> {
        debug!(organization_id = %organization_id, item_id = %id, delta, "Adjusting quantity");

        let sql = format!(
            r#"
            UPDATE inventory_items
            SET quantity = quantity + ?3, updated_at = ?4
            WHERE id = ?1 AND organization_id = ?2 AND quantity + ?3 >= 0
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );

        let updated = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(id)
            .bind(organization_id)
            .bind(delta)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::loading("item"))?;

        if let Some(item) = updated {
            return Ok(item);
        }

        // Nothing matched: either the item isn't ours or the guard refused.
        let current = fetch_item(&self.pool, organization_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))?;

        Err(CoreError::InsufficientStock {
            item_id: id.to_string(),
            available: current.quantity,
            requested: delta.saturating_neg(),
        }
        .into())
    }

    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM inventory_items WHERE id = ?1 AND organization_id = ?2")
                .bind(id)
                .bind(organization_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        debug!(organization_id = %organization_id, item_id = %id, "Deleted item");
        Ok(())
    }

    /// Number of items the organization holds (for plan usage display).
    pub async fn count(&self, organization_id: &str) -> DbResult<u32> {
        count_for_organization(&self.pool, "inventory_items", organization_id).await
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Trims optional text, treating blank as absent.
fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn sku_conflict(err: sqlx::Error, sku: &Option<String>) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => {
            DbError::duplicate("sku", sku.as_deref().unwrap_or_default())
        }
        other => other,
    }
}

async fn fetch_item<'e, E>(
    executor: E,
    organization_id: &str,
    id: &str,
) -> DbResult<Option<InventoryItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM inventory_items WHERE id = ?1 AND organization_id = ?2",
        ITEM_COLUMNS
    );

    let item = sqlx::query_as::<_, InventoryItem>(&sql)
        .bind(id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await
        .map_err(DbError::loading("item"))?;

    Ok(item)
}

/// Category and location ids must exist in the same organization. The
/// foreign keys only prove they exist somewhere.
async fn ensure_references(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    organization_id: &str,
    item: &InventoryItem,
) -> DbResult<()> {
    for (table, entity, id) in [
        ("categories", "Category", &item.category_id),
        ("locations", "Location", &item.location_id),
    ] {
        let Some(id) = id else { continue };

        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE id = ?1 AND organization_id = ?2",
            table
        );
        let found: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_one(&mut **tx)
            .await?;

        if found == 0 {
            return Err(DbError::not_found(entity, id));
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db_with_org, file_db};
    use chrono::NaiveDate;
    use clinicstock_core::{PlanError, PlanTier, ValidationError};

    fn new_item(name: &str, sku: Option<&str>) -> NewItem {
        NewItem {
            name: name.to_string(),
            sku: sku.map(str::to_string),
            category_id: None,
            location_id: None,
            lot_number: Some("LOT-42".to_string()),
            quantity: 10,
            unit_cost: "45.00".to_string(),
            expiration_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            reorder_threshold: Some(3),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (db, org_id) = db_with_org(PlanTier::Starter).await;
        let repo = db.items();

        let item = repo
            .insert(&org_id, &new_item("Botox 100U", Some("BTX-100")))
            .await
            .unwrap();
        assert_eq!(item.unit_cost_cents, 4500);
        assert_eq!(item.stock_value().cents(), 45_000);

        let fetched = repo.get(&org_id, &item.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Botox 100U");
        assert_eq!(fetched.expiration_date, NaiveDate::from_ymd_opt(2026, 9, 1));
        assert_eq!(fetched.reorder_threshold, Some(3));

        // Not visible to another organization
        assert!(repo.get("other-org", &item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_validates_input() {
        let (db, org_id) = db_with_org(PlanTier::Starter).await;

        let mut bad = new_item("Gauze", None);
        bad.unit_cost = "-1.00".to_string();
        let err = db.items().insert(&org_id, &bad).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let mut bad = new_item("Gauze", None);
        bad.quantity = -3;
        let err = db.items().insert(&org_id, &bad).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_sku_within_org() {
        let (db, org_id) = db_with_org(PlanTier::Starter).await;
        let repo = db.items();

        repo.insert(&org_id, &new_item("Botox 100U", Some("BTX-100")))
            .await
            .unwrap();
        let err = repo
            .insert(&org_id, &new_item("Botox again", Some("BTX-100")))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "sku"));

        // Items without SKU never collide
        repo.insert(&org_id, &new_item("Gauze", None)).await.unwrap();
        repo.insert(&org_id, &new_item("Gloves", None)).await.unwrap();
        assert_eq!(repo.count(&org_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_item_cap_follows_plan() {
        let (db, org_id) = db_with_org(PlanTier::Free).await;
        let repo = db.items();

        for i in 0..50 {
            repo.insert(&org_id, &new_item(&format!("Item {}", i), None))
                .await
                .unwrap();
        }

        let err = repo
            .insert(&org_id, &new_item("One too many", None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Plan(PlanError::LimitReached { limit: 50, .. }))
        ));
    }

    #[tokio::test]
    async fn test_references_must_belong_to_org() {
        let (db, org_id) = db_with_org(PlanTier::Starter).await;
        let other = db
            .organizations()
            .create("Other Clinic", PlanTier::Starter)
            .await
            .unwrap();
        let foreign_location = db
            .locations()
            .insert(&other.id, "Their fridge", None)
            .await
            .unwrap();
        let own_category = db.categories().insert(&org_id, "Fillers").await.unwrap();

        let mut input = new_item("Juvederm", None);
        input.location_id = Some(foreign_location.id.clone());
        assert!(matches!(
            db.items().insert(&org_id, &input).await,
            Err(DbError::NotFound { ref entity, .. }) if entity == "Location"
        ));

        input.location_id = None;
        input.category_id = Some(own_category.id.clone());
        let item = db.items().insert(&org_id, &input).await.unwrap();
        assert_eq!(item.category_id.as_deref(), Some(own_category.id.as_str()));
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let (db, org_id) = db_with_org(PlanTier::Starter).await;
        let repo = db.items();
        let item = repo
            .insert(&org_id, &new_item("Botox 100U", Some("BTX-100")))
            .await
            .unwrap();

        let mut input = new_item("Botox 50U", Some("BTX-50"));
        input.quantity = 4;
        input.unit_cost = "22.5".to_string();
        input.reorder_threshold = None;

        let updated = repo.update(&org_id, &item.id, &input).await.unwrap();
        assert_eq!(updated.name, "Botox 50U");
        assert_eq!(updated.unit_cost_cents, 2250);
        assert_eq!(updated.id, item.id);

        let fetched = repo.get(&org_id, &item.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku.as_deref(), Some("BTX-50"));
        assert_eq!(fetched.quantity, 4);
        assert_eq!(fetched.reorder_threshold, None);

        assert!(matches!(
            repo.update("other-org", &item.id, &input).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_adjust_quantity() {
        let (db, org_id) = db_with_org(PlanTier::Starter).await;
        let repo = db.items();
        let item = repo
            .insert(&org_id, &new_item("Syringes 1ml", None))
            .await
            .unwrap();

        let item = repo.adjust_quantity(&org_id, &item.id, -4).await.unwrap();
        assert_eq!(item.quantity, 6);

        let item = repo.adjust_quantity(&org_id, &item.id, 20).await.unwrap();
        assert_eq!(item.quantity, 26);

        let err = repo
            .adjust_quantity(&org_id, &item.id, -27)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock {
                available: 26,
                requested: 27,
                ..
            })
        ));

        // Failed adjustment leaves the row alone
        let stored = repo.get(&org_id, &item.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 26);

        // Using everything is allowed
        let item = repo.adjust_quantity(&org_id, &item.id, -26).await.unwrap();
        assert_eq!(item.quantity, 0);

        assert!(matches!(
            repo.adjust_quantity("other-org", &item.id, 5).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.adjust_quantity(&org_id, "missing", 5).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adjustments_all_land() {
        let (db, _dir) = file_db(5).await;
        let org = db
            .organizations()
            .create("Glow Aesthetics", PlanTier::Starter)
            .await
            .unwrap();

        let mut input = new_item("Syringes 1ml", None);
        input.quantity = 100;
        let item = db.items().insert(&org.id, &input).await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let repo = db.items();
                let org_id = org.id.clone();
                let item_id = item.id.clone();
                tokio::spawn(async move { repo.adjust_quantity(&org_id, &item_id, -1).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = db.items().get(&org.id, &item.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 80);
        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_usage_never_goes_negative() {
        let (db, _dir) = file_db(5).await;
        let org = db
            .organizations()
            .create("Glow Aesthetics", PlanTier::Starter)
            .await
            .unwrap();

        let mut input = new_item("Botox 100U", None);
        input.quantity = 5;
        let item = db.items().insert(&org.id, &input).await.unwrap();

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let repo = db.items();
                let org_id = org.id.clone();
                let item_id = item.id.clone();
                tokio::spawn(async move { repo.adjust_quantity(&org_id, &item_id, -1).await })
            })
            .collect();

        let mut used = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => used += 1,
                Err(DbError::Core(CoreError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(used, 5);
        let stored = db.items().get(&org.id, &item.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 0);
        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_respect_item_cap() {
        let (db, _dir) = file_db(5).await;
        let org = db
            .organizations()
            .create("Glow Aesthetics", PlanTier::Free)
            .await
            .unwrap();

        let handles: Vec<_> = (0..60)
            .map(|i| {
                let repo = db.items();
                let org_id = org.id.clone();
                let input = new_item(&format!("Item {}", i), None);
                tokio::spawn(async move { repo.insert(&org_id, &input).await })
            })
            .collect();

        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => {}
                Err(DbError::Core(CoreError::Plan(PlanError::LimitReached { .. }))) => {
                    refused += 1
                }
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(refused, 10);
        assert_eq!(db.items().count(&org.id).await.unwrap(), 50);
        db.close().await;
    }

    #[tokio::test]
    async fn test_delete_and_list_order() {
        let (db, org_id) = db_with_org(PlanTier::Starter).await;
        let repo = db.items();

        let mut later = new_item("Later", None);
        later.expiration_date = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let mut sooner = new_item("Sooner", None);
        sooner.expiration_date = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();

        let later = repo.insert(&org_id, &later).await.unwrap();
        repo.insert(&org_id, &sooner).await.unwrap();

        let names: Vec<String> = repo
            .list(&org_id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Sooner", "Later"]);

        repo.delete(&org_id, &later.id).await.unwrap();
        assert!(matches!(
            repo.delete(&org_id, &later.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(repo.count(&org_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_location_with_stock_cannot_be_deleted() {
        let (db, org_id) = db_with_org(PlanTier::Starter).await;
        let fridge = db
            .locations()
            .insert(&org_id, "Main fridge", None)
            .await
            .unwrap();

        let mut input = new_item("Botox 100U", None);
        input.location_id = Some(fridge.id.clone());
        db.items().insert(&org_id, &input).await.unwrap();

        assert!(matches!(
            db.locations().delete(&org_id, &fridge.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
