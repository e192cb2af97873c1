//! # Domain Types
//!
//! Records owned by the persistence layer and read by the engine.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌────────────────────┐   ┌──────────────────┐  │
//! │  │  Organization    │   │ InventorySettings  │   │  InventoryItem   │  │
//! │  │  ──────────────  │   │ ─────────────────  │   │  ──────────────  │  │
//! │  │  id (UUID)       │──►│ warning_days       │   │  quantity        │  │
//! │  │  name            │   │ low_stock_thresh.  │   │  unit_cost_cents │  │
//! │  │  plan_tier       │   │ threshold_policy   │   │  expiration_date │  │
//! │  └──────────────────┘   └────────────────────┘   │  reorder_thresh. │  │
//! │                                                   └──────────────────┘  │
//! │  ┌──────────────────┐   ┌────────────────────┐   ┌──────────────────┐  │
//! │  │    Category      │   │     Location       │   │     Member       │  │
//! │  └──────────────────┘   └────────────────────┘   └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every tenant-owned record carries `organization_id`; repositories always
//! filter on it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::DataIntegrityError;
use crate::money::Money;
use crate::plan::PlanTier;
use crate::{DEFAULT_EXPIRATION_WARNING_DAYS, DEFAULT_LOW_STOCK_THRESHOLD};

// =============================================================================
// Organization
// =============================================================================

/// A clinic (tenant).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// Stored lowercase tier name; see [`Organization::plan`].
    pub plan_tier: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// Parses the stored tier name.
    pub fn plan(&self) -> Result<PlanTier, DataIntegrityError> {
        PlanTier::from_str(&self.plan_tier)
    }
}

// =============================================================================
// Threshold Policy
// =============================================================================

/// How an item's reorder threshold overrides the organization default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Override applies only when set and non-zero; `0` means "use default".
    #[default]
    Truthy,
    /// Any present override applies, including `0`.
    Explicit,
}

impl ThresholdPolicy {
    /// Picks the threshold that applies to an item.
    ///
    /// ```rust
    /// use clinicstock_core::ThresholdPolicy;
    ///
    /// assert_eq!(ThresholdPolicy::Truthy.resolve(Some(0), 10), 10);
    /// assert_eq!(ThresholdPolicy::Explicit.resolve(Some(0), 10), 0);
    /// assert_eq!(ThresholdPolicy::Explicit.resolve(None, 10), 10);
    /// ```
    pub fn resolve(self, item_override: Option<i64>, default: i64) -> i64 {
        match (self, item_override) {
            (ThresholdPolicy::Truthy, Some(t)) if t != 0 => t,
            (ThresholdPolicy::Explicit, Some(t)) => t,
            _ => default,
        }
    }
}

// =============================================================================
// Inventory Settings
// =============================================================================

/// Per-organization configuration for the status engine, as stored.
///
/// Fields are optional because rows written by older releases may lack
/// them. [`crate::status::ClassificationRules::from_settings`] turns a
/// missing value into a [`DataIntegrityError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventorySettings {
    pub organization_id: String,
    pub expiration_warning_days: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub threshold_policy: ThresholdPolicy,
}

impl InventorySettings {
    /// Settings a new organization starts with.
    pub fn defaults(organization_id: impl Into<String>) -> Self {
        InventorySettings {
            organization_id: organization_id.into(),
            expiration_warning_days: Some(DEFAULT_EXPIRATION_WARNING_DAYS),
            low_stock_threshold: Some(DEFAULT_LOW_STOCK_THRESHOLD),
            threshold_policy: ThresholdPolicy::Truthy,
        }
    }
}

// =============================================================================
// Catalog: Category / Location
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A storage place inside a clinic (fridge, treatment room, back office).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Team Membership
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Admin,
    Staff,
}

impl MemberRole {
    /// Owners and admins may change settings and manage the team.
    pub fn can_manage(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub organization_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: MemberRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory Item
// =============================================================================

/// A trackable inventory unit.
///
/// `expiration_date` is optional only at the storage boundary; the status
/// engine refuses to classify an item without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub category_id: Option<String>,
    pub location_id: Option<String>,
    pub lot_number: Option<String>,
    pub quantity: i64,
    /// Unit cost in cents; `unitCost` in dollars on the wire.
    #[serde(rename = "unitCost", with = "crate::money::cents_as_dollars")]
    #[ts(type = "number")]
    pub unit_cost_cents: i64,
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,
    /// Item-level low stock override.
    pub reorder_threshold: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// `unit_cost × quantity`.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.unit_cost().multiply_quantity(self.quantity)
    }
}

/// Input for creating or replacing an item.
///
/// `unit_cost` arrives as a decimal string from forms and CSV imports and is
/// parsed into cents by [`crate::validation::validate_new_item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub sku: Option<String>,
    pub category_id: Option<String>,
    pub location_id: Option<String>,
    pub lot_number: Option<String>,
    pub quantity: i64,
    pub unit_cost: String,
    #[ts(as = "String")]
    pub expiration_date: NaiveDate,
    pub reorder_threshold: Option<i64>,
}
