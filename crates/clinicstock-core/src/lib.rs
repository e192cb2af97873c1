//! # clinicstock-core: Pure Business Logic for ClinicStock
//!
//! Inventory status engine for medical and aesthetic clinics, plus the
//! small rule sets around it. Zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ClinicStock Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Route handlers / dashboard (external)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               clinicstock-db (repositories, reports)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ items + settings + now                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ clinicstock-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐  │   │
//! │  │   │  status  │  │ summary  │  │   plan   │  │   alerts     │  │   │
//! │  │   │ classify │  │ summarize│  │  limits  │  │ build_alerts │  │   │
//! │  │   │          │  │  waste   │  │ features │  │              │  │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO IMPLICIT CLOCK • PURE FUNCTIONS    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (InventoryItem, InventorySettings, Organization, ...)
//! - [`status`] - Status classification
//! - [`summary`] - Summary and waste aggregation
//! - [`plan`] - Subscription tier limits and features
//! - [`alerts`] - Notification rules
//! - [`money`] - Integer-cents money
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use clinicstock_core::{classify_all, summarize, InventoryItem, InventorySettings, ItemStatus};
//!
//! let now = Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap();
//! let settings = InventorySettings::defaults("org-1");
//!
//! let item = InventoryItem {
//!     id: "item-1".into(),
//!     organization_id: "org-1".into(),
//!     name: "Botox 100U".into(),
//!     sku: None,
//!     category_id: None,
//!     location_id: None,
//!     lot_number: None,
//!     quantity: 5,
//!     unit_cost_cents: 4500,
//!     expiration_date: Some((now + Duration::days(45)).date_naive()),
//!     reorder_threshold: Some(10),
//!     created_at: now,
//!     updated_at: now,
//! };
//!
//! let classified = classify_all(&[item], &settings, now).unwrap();
//! assert_eq!(classified[0].status, ItemStatus::LowStock);
//!
//! let summary = summarize(&classified);
//! assert_eq!(summary.low_stock, 1);
//! assert_eq!(summary.total_value.cents(), 22_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod error;
pub mod money;
pub mod plan;
pub mod status;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use alerts::{build_alerts, Alert, AlertKind, Severity};
pub use error::{CoreError, CoreResult, DataIntegrityError, PlanError, ValidationError};
pub use money::Money;
pub use plan::{check_capacity, require_feature, Feature, PlanLimits, PlanTier, Resource};
pub use status::{
    classify, classify_all, classify_now, days_until_expiration, ClassificationRules, ItemStatus,
    ItemWithStatus,
};
pub use summary::{summarize, summarize_by, waste_report, InventorySummary, WasteReport};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Warning window new organizations start with.
pub const DEFAULT_EXPIRATION_WARNING_DAYS: i64 = 30;

/// Low stock floor new organizations start with.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Trailing window for the waste report when the caller gives none.
pub const DEFAULT_WASTE_WINDOW_DAYS: i64 = 30;

/// Upper bound on the warning window (ten years).
pub const MAX_WARNING_DAYS: i64 = 3650;

/// Maximum length of any display name.
pub const MAX_NAME_LENGTH: usize = 200;
