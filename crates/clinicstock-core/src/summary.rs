//! # Summary & Waste Aggregation
//!
//! Folds classified items into dashboard figures.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  [ItemWithStatus] ──► summarize ──► InventorySummary                    │
//! │                                      totalItems   += 1                  │
//! │                                      totalValue   += cost × qty         │
//! │                                      one of expired / expiringSoon /    │
//! │                                      lowStock     += 1 (ok: none)       │
//! │                                                                         │
//! │  [ItemWithStatus] ──► waste_report(window) ──► WasteReport              │
//! │                       expired within the trailing window only           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The fold is commutative, so partitions may be summarized separately and
//! combined with [`InventorySummary::merge`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::status::{expires_at, ItemStatus, ItemWithStatus};

// =============================================================================
// Inventory Summary
// =============================================================================

/// Aggregate figures over a set of classified items.
///
/// `total_value` is summed in cents and goes out as a dollar number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_items: usize,
    #[serde(with = "crate::money::dollars")]
    #[ts(type = "number")]
    pub total_value: Money,
    pub expiring_soon: usize,
    pub expired: usize,
    pub low_stock: usize,
}

impl InventorySummary {
    /// Adds one item to the running totals.
    pub fn record(&mut self, entry: &ItemWithStatus) {
        self.total_items += 1;
        self.total_value += entry.item.stock_value();

        match entry.status {
            ItemStatus::ExpiringSoon => self.expiring_soon += 1,
            ItemStatus::Expired => self.expired += 1,
            ItemStatus::LowStock => self.low_stock += 1,
            ItemStatus::Ok => {}
        }
    }

    /// Combines two partial summaries.
    pub fn merge(self, other: InventorySummary) -> InventorySummary {
        InventorySummary {
            total_items: self.total_items + other.total_items,
            total_value: self.total_value + other.total_value,
            expiring_soon: self.expiring_soon + other.expiring_soon,
            expired: self.expired + other.expired,
            low_stock: self.low_stock + other.low_stock,
        }
    }

    /// Items needing attention (anything not `ok`).
    pub fn attention_count(&self) -> usize {
        self.expiring_soon + self.expired + self.low_stock
    }
}

/// Summarizes a collection of classified items.
///
/// ## Example
/// ```rust
/// use clinicstock_core::summary::summarize;
/// use clinicstock_core::ItemWithStatus;
///
/// let none: Vec<ItemWithStatus> = Vec::new();
/// let empty = summarize(&none);
/// assert_eq!(empty.total_items, 0);
/// assert!(empty.total_value.is_zero());
/// ```
pub fn summarize<'a, I>(items: I) -> InventorySummary
where
    I: IntoIterator<Item = &'a ItemWithStatus>,
{
    items
        .into_iter()
        .fold(InventorySummary::default(), |mut summary, entry| {
            summary.record(entry);
            summary
        })
}

/// Summaries grouped by `key` (category, location, ...).
pub fn summarize_by<'a, I, K, F>(items: I, key: F) -> BTreeMap<K, InventorySummary>
where
    I: IntoIterator<Item = &'a ItemWithStatus>,
    K: Ord,
    F: Fn(&ItemWithStatus) -> K,
{
    let mut groups: BTreeMap<K, InventorySummary> = BTreeMap::new();
    for entry in items {
        groups.entry(key(entry)).or_default().record(entry);
    }
    groups
}

// =============================================================================
// Waste Report
// =============================================================================

/// Stock that expired unused inside the trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WasteReport {
    pub window_days: i64,
    pub expired_items: Vec<ItemWithStatus>,
    #[serde(with = "crate::money::dollars")]
    #[ts(type = "number")]
    pub total_waste_value: Money,
    pub waste_count: usize,
}

/// Builds the waste report for the last `window_days` days.
///
/// Only items whose status is `expired` and whose expiry falls on or after
/// `now - window_days` are counted; older expirations are assumed to have
/// been written off already. Input order is preserved.
pub fn waste_report(
    items: &[ItemWithStatus],
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<WasteReport, ValidationError> {
    if window_days < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "window_days".to_string(),
        });
    }

    let window_start = Duration::try_days(window_days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "window_days".to_string(),
            min: 0,
            max: i64::from(i32::MAX),
        })?;

    let expired_items: Vec<ItemWithStatus> = items
        .iter()
        .filter(|entry| entry.status == ItemStatus::Expired)
        .filter(|entry| {
            entry
                .item
                .expiration_date
                .map(|date| expires_at(date) >= window_start)
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    let total_waste_value = expired_items
        .iter()
        .map(|entry| entry.item.stock_value())
        .sum();

    Ok(WasteReport {
        window_days,
        waste_count: expired_items.len(),
        total_waste_value,
        expired_items,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
