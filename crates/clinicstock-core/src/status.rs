//! # Status Engine
//!
//! Derives the urgency status of an item relative to an explicit "now".
//!
//! ## Precedence (first match wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  classify(item, settings, now)                                          │
//! │       │                                                                 │
//! │       ├── now > expires_at(expiration_date)         ──► expired        │
//! │       │                                                                 │
//! │       ├── floor(days until expiry) ≤ warning_days   ──► expiring_soon  │
//! │       │                                                                 │
//! │       ├── quantity ≤ effective threshold            ──► low_stock      │
//! │       │       (item override, else org default)                         │
//! │       │                                                                 │
//! │       └── otherwise                                 ──► ok             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An expiration date is a calendar day; the item expires at the start of
//! that day in UTC. Day counts are floored, so 0.9 days left is 0 days.
//!
//! Nothing here reads the clock except [`classify_now`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use ts_rs::TS;

use crate::error::DataIntegrityError;
use crate::types::{InventoryItem, InventorySettings, ThresholdPolicy};

const MILLIS_PER_DAY: i64 = 86_400_000;

// =============================================================================
// Item Status
// =============================================================================

/// Derived classification of an item. Computed on every read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Ok,
    LowStock,
    ExpiringSoon,
    Expired,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Ok => "ok",
            ItemStatus::LowStock => "low_stock",
            ItemStatus::ExpiringSoon => "expiring_soon",
            ItemStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item together with its status, as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemWithStatus {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub status: ItemStatus,
}

// =============================================================================
// Classification Rules
// =============================================================================

/// Settings resolved into the values classification needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRules {
    pub expiration_warning_days: i64,
    pub low_stock_threshold: i64,
    pub threshold_policy: ThresholdPolicy,
}

impl ClassificationRules {
    /// Resolves stored settings, failing on absent or negative fields.
    pub fn from_settings(settings: &InventorySettings) -> Result<Self, DataIntegrityError> {
        let warning = required(
            settings.expiration_warning_days,
            "expiration_warning_days",
            &settings.organization_id,
        )?;
        let threshold = required(
            settings.low_stock_threshold,
            "low_stock_threshold",
            &settings.organization_id,
        )?;

        Ok(ClassificationRules {
            expiration_warning_days: warning,
            low_stock_threshold: threshold,
            threshold_policy: settings.threshold_policy,
        })
    }

    /// Threshold that applies to `item`.
    pub fn effective_threshold(&self, item: &InventoryItem) -> i64 {
        self.threshold_policy
            .resolve(item.reorder_threshold, self.low_stock_threshold)
    }

    /// Classifies one item.
    pub fn classify(
        &self,
        item: &InventoryItem,
        now: DateTime<Utc>,
    ) -> Result<ItemStatus, DataIntegrityError> {
        let expiration_date = item
            .expiration_date
            .ok_or_else(|| DataIntegrityError::missing("item", "expiration_date", &item.id))?;
        if item.quantity < 0 {
            return Err(DataIntegrityError::Negative {
                entity: "item",
                field: "quantity",
                value: item.quantity,
            });
        }

        if now > expires_at(expiration_date) {
            return Ok(ItemStatus::Expired);
        }

        if days_until_expiration(expiration_date, now) <= self.expiration_warning_days {
            return Ok(ItemStatus::ExpiringSoon);
        }

        if item.quantity <= self.effective_threshold(item) {
            return Ok(ItemStatus::LowStock);
        }

        Ok(ItemStatus::Ok)
    }
}

fn required(value: Option<i64>, field: &'static str, org: &str) -> Result<i64, DataIntegrityError> {
    match value {
        None => Err(DataIntegrityError::missing("settings", field, org)),
        Some(v) if v < 0 => Err(DataIntegrityError::Negative {
            entity: "settings",
            field,
            value: v,
        }),
        Some(v) => Ok(v),
    }
}

// =============================================================================
// Date Helpers
// =============================================================================

/// The instant an item expires: the start of its expiration day, UTC.
#[inline]
pub fn expires_at(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Whole days from `now` until expiry, floored (negative once expired).
pub fn days_until_expiration(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    (expires_at(date) - now)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

// =============================================================================
// Entry Points
// =============================================================================

/// Classifies `item` against stored `settings` at `now`.
pub fn classify(
    item: &InventoryItem,
    settings: &InventorySettings,
    now: DateTime<Utc>,
) -> Result<ItemStatus, DataIntegrityError> {
    ClassificationRules::from_settings(settings)?.classify(item, now)
}

/// [`classify`] at the current wall-clock time. For outermost callers only.
pub fn classify_now(
    item: &InventoryItem,
    settings: &InventorySettings,
) -> Result<ItemStatus, DataIntegrityError> {
    classify(item, settings, Utc::now())
}

/// Classifies a whole collection. The first bad record aborts the pass and
/// no partial result is returned.
pub fn classify_all(
    items: &[InventoryItem],
    settings: &InventorySettings,
    now: DateTime<Utc>,
) -> Result<Vec<ItemWithStatus>, DataIntegrityError> {
    let rules = ClassificationRules::from_settings(settings)?;

    let classified = items
        .iter()
        .map(|item| {
            rules.classify(item, now).map(|status| ItemWithStatus {
                item: item.clone(),
                status,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        organization_id = %settings.organization_id,
        count = classified.len(),
        "Classified inventory items"
    );

    Ok(classified)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub(crate) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap()
    }

    pub(crate) fn settings(warning: i64, low_stock: i64) -> InventorySettings {
        InventorySettings {
            organization_id: "org-1".to_string(),
            expiration_warning_days: Some(warning),
            low_stock_threshold: Some(low_stock),
            threshold_policy: ThresholdPolicy::Truthy,
        }
    }

    /// Item whose expiry is `days` calendar days after `now()`'s date.
    pub(crate) fn item_expiring_in(days: i64, qty: i64, reorder: Option<i64>) -> InventoryItem {
        let date = (now() + Duration::days(days)).date_naive();
        InventoryItem {
            id: format!("item-{}-{}", days, qty),
            organization_id: "org-1".to_string(),
            name: "Hyaluronic filler 1ml".to_string(),
            sku: None,
            category_id: None,
            location_id: None,
            lot_number: None,
            quantity: qty,
            unit_cost_cents: 4500,
            expiration_date: Some(date),
            reorder_threshold: reorder,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_item_override_drives_low_stock() {
        // quantity 5, override 10, org default 5, expires in 45 days
        let item = item_expiring_in(45, 5, Some(10));
        let status = classify(&item, &settings(30, 5), now()).unwrap();
        assert_eq!(status, ItemStatus::LowStock);

        let rules = ClassificationRules::from_settings(&settings(30, 5)).unwrap();
        assert_eq!(rules.effective_threshold(&item), 10);
    }

    #[test]
    fn test_expired_wins_over_quantity() {
        let item = item_expiring_in(-1, 1000, Some(20));
        assert_eq!(
            classify(&item, &settings(30, 5), now()).unwrap(),
            ItemStatus::Expired
        );
    }

    #[test]
    fn test_healthy_item_is_ok() {
        let item = item_expiring_in(365, 125, Some(20));
        assert_eq!(
            classify(&item, &settings(30, 5), now()).unwrap(),
            ItemStatus::Ok
        );
    }

    #[test]
    fn test_expiring_soon_beats_low_stock() {
        let item = item_expiring_in(10, 0, Some(20));
        assert_eq!(
            classify(&item, &settings(30, 5), now()).unwrap(),
            ItemStatus::ExpiringSoon
        );
    }

    #[test]
    fn test_warning_window_boundary_uses_floor() {
        // Expiry is 31 calendar days out, but now() is 14:30, so only
        // 30.4 days remain and the floor is 30.
        let item = item_expiring_in(31, 100, None);
        let date = item.expiration_date.unwrap();
        assert_eq!(days_until_expiration(date, now()), 30);
        assert_eq!(
            classify(&item, &settings(30, 5), now()).unwrap(),
            ItemStatus::ExpiringSoon
        );

        let item = item_expiring_in(32, 100, None);
        assert_eq!(
            classify(&item, &settings(30, 5), now()).unwrap(),
            ItemStatus::Ok
        );
    }

    #[test]
    fn test_fraction_of_a_day_counts_as_zero() {
        let tomorrow = (now() + Duration::days(1)).date_naive();
        // 9.5 hours until midnight
        assert_eq!(days_until_expiration(tomorrow, now()), 0);

        let item = item_expiring_in(1, 100, None);
        assert_eq!(
            classify(&item, &settings(0, 5), now()).unwrap(),
            ItemStatus::ExpiringSoon
        );
    }

    #[test]
    fn test_expiry_instant_is_start_of_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let midnight = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
        let item = InventoryItem {
            expiration_date: Some(date),
            ..item_expiring_in(0, 100, None)
        };

        // Exactly at expiry: not yet expired, zero days left.
        assert_eq!(
            classify(&item, &settings(0, 5), midnight).unwrap(),
            ItemStatus::ExpiringSoon
        );
        // One millisecond later it is expired.
        assert_eq!(
            classify(&item, &settings(0, 5), midnight + Duration::milliseconds(1)).unwrap(),
            ItemStatus::Expired
        );
        // Later the same day (what now() is) also expired.
        assert_eq!(
            classify(&item, &settings(30, 5), now()).unwrap(),
            ItemStatus::Expired
        );
    }

    #[test]
    fn test_zero_override_falls_back_under_truthy_policy() {
        let item = item_expiring_in(200, 3, Some(0));
        assert_eq!(
            classify(&item, &settings(30, 5), now()).unwrap(),
            ItemStatus::LowStock
        );
    }

    #[test]
    fn test_zero_override_is_honored_under_explicit_policy() {
        let item = item_expiring_in(200, 3, Some(0));
        let settings = InventorySettings {
            threshold_policy: ThresholdPolicy::Explicit,
            ..settings(30, 5)
        };
        assert_eq!(classify(&item, &settings, now()).unwrap(), ItemStatus::Ok);
    }

    #[test]
    fn test_quantity_equal_to_threshold_is_low() {
        let item = item_expiring_in(200, 5, None);
        assert_eq!(
            classify(&item, &settings(30, 5), now()).unwrap(),
            ItemStatus::LowStock
        );
    }

    #[test]
    fn test_missing_expiration_date_is_integrity_error() {
        let item = InventoryItem {
            expiration_date: None,
            ..item_expiring_in(10, 1, None)
        };
        let err = classify(&item, &settings(30, 5), now()).unwrap_err();
        assert!(matches!(
            err,
            DataIntegrityError::MissingField {
                field: "expiration_date",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_settings_fields_are_integrity_errors() {
        let item = item_expiring_in(100, 50, None);

        let mut s = settings(30, 5);
        s.expiration_warning_days = None;
        assert!(matches!(
            classify(&item, &s, now()),
            Err(DataIntegrityError::MissingField {
                field: "expiration_warning_days",
                ..
            })
        ));

        let mut s = settings(30, 5);
        s.low_stock_threshold = Some(-1);
        assert!(matches!(
            classify(&item, &s, now()),
            Err(DataIntegrityError::Negative { .. })
        ));
    }

    #[test]
    fn test_classify_all_is_all_or_nothing() {
        let good = item_expiring_in(100, 50, None);
        let bad = InventoryItem {
            expiration_date: None,
            ..item_expiring_in(5, 5, None)
        };

        let result = classify_all(&[good.clone(), bad, good.clone()], &settings(30, 5), now());
        assert!(result.is_err());

        let ok = classify_all(&[good.clone()], &settings(30, 5), now()).unwrap();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].status, ItemStatus::Ok);
        assert_eq!(ok[0].item, good);
    }

    #[test]
    fn test_status_serializes_snake_case_and_flattens() {
        let with_status = ItemWithStatus {
            item: item_expiring_in(10, 1, None),
            status: ItemStatus::ExpiringSoon,
        };
        let json = serde_json::to_value(&with_status).unwrap();
        assert_eq!(json["status"], "expiring_soon");
        assert_eq!(json["quantity"], 1);
        assert_eq!(json["unitCost"], 45);
        assert_eq!(ItemStatus::LowStock.to_string(), "low_stock");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn past_expiry_is_always_expired(
                days_ago in 1i64..2000,
                qty in 0i64..100_000,
                reorder in proptest::option::of(0i64..1000),
                warning in 0i64..365,
                low in 0i64..1000,
            ) {
                let item = item_expiring_in(-days_ago, qty, reorder);
                prop_assert_eq!(
                    classify(&item, &settings(warning, low), now()).unwrap(),
                    ItemStatus::Expired
                );
            }

            #[test]
            fn inside_warning_window_is_expiring_soon(
                warning in 1i64..365,
                offset in 0i64..365,
                qty in 0i64..100_000,
            ) {
                // Calendar days ahead in 1..=warning gives floor days in 0..warning.
                let days = 1 + offset % warning;
                let item = item_expiring_in(days, qty, None);
                prop_assert_eq!(
                    classify(&item, &settings(warning, 10), now()).unwrap(),
                    ItemStatus::ExpiringSoon
                );
            }

            #[test]
            fn classify_is_idempotent(
                days in -400i64..400,
                qty in 0i64..500,
                reorder in proptest::option::of(0i64..50),
            ) {
                let item = item_expiring_in(days, qty, reorder);
                let s = settings(30, 10);
                prop_assert_eq!(
                    classify(&item, &s, now()).unwrap(),
                    classify(&item, &s, now()).unwrap()
                );
            }

            #[test]
            fn at_or_below_threshold_is_low_stock(
                threshold in 1i64..1000,
                below in 0i64..1000,
            ) {
                let qty = below % (threshold + 1);
                let item = item_expiring_in(400, qty, Some(threshold));
                prop_assert_eq!(
                    classify(&item, &settings(30, 0), now()).unwrap(),
                    ItemStatus::LowStock
                );
            }
        }
    }
}
