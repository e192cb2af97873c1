//! # Subscription Plans
//!
//! Tier limits and feature flags. Billing itself lives with the payment
//! provider; this module only answers "may this organization do X?".
//!
//! ```text
//! ┌──────────────┬───────────┬───────────┬──────────┬────────────────────────┐
//! │ Tier         │ Items     │ Locations │ Members  │ Features               │
//! ├──────────────┼───────────┼───────────┼──────────┼────────────────────────┤
//! │ free         │ 50        │ 1         │ 1        │ -                      │
//! │ starter      │ 500       │ 3         │ 5        │ alerts, locations, csv │
//! │ professional │ 5,000     │ 10        │ 25       │ + waste reports        │
//! │ enterprise   │ unlimited │ unlimited │ unlimited│ + api access           │
//! └──────────────┴───────────┴───────────┴──────────┴────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{DataIntegrityError, PlanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Starter,
    Professional,
    Enterprise,
}

/// Countable resources a plan caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Items,
    Locations,
    Members,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Expiry notifications (low stock alerts are on every tier).
    ExpirationAlerts,
    /// Per-location breakdowns on the dashboard.
    MultiLocation,
    CsvExport,
    WasteReports,
    ApiAccess,
}

/// Caps for one tier. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub max_items: Option<u32>,
    pub max_locations: Option<u32>,
    pub max_members: Option<u32>,
}

impl PlanLimits {
    pub fn for_resource(&self, resource: Resource) -> Option<u32> {
        match resource {
            Resource::Items => self.max_items,
            Resource::Locations => self.max_locations,
            Resource::Members => self.max_members,
        }
    }
}

impl PlanTier {
    pub const fn limits(&self) -> PlanLimits {
        match self {
            PlanTier::Free => PlanLimits {
                max_items: Some(50),
                max_locations: Some(1),
                max_members: Some(1),
            },
            PlanTier::Starter => PlanLimits {
                max_items: Some(500),
                max_locations: Some(3),
                max_members: Some(5),
            },
            PlanTier::Professional => PlanLimits {
                max_items: Some(5_000),
                max_locations: Some(10),
                max_members: Some(25),
            },
            PlanTier::Enterprise => PlanLimits {
                max_items: None,
                max_locations: None,
                max_members: None,
            },
        }
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::ExpirationAlerts | Feature::MultiLocation | Feature::CsvExport => {
                *self >= PlanTier::Starter
            }
            Feature::WasteReports => *self >= PlanTier::Professional,
            Feature::ApiAccess => *self == PlanTier::Enterprise,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Starter => "starter",
            PlanTier::Professional => "professional",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored tier names are trusted data; an unknown one is an integrity error.
impl FromStr for PlanTier {
    type Err = DataIntegrityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "starter" => Ok(PlanTier::Starter),
            "professional" => Ok(PlanTier::Professional),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(DataIntegrityError::malformed(
                "organization",
                "plan_tier",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Items => "items",
            Resource::Locations => "locations",
            Resource::Members => "members",
        })
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feature::ExpirationAlerts => "Expiration alerts",
            Feature::MultiLocation => "Multi-location reporting",
            Feature::CsvExport => "CSV export",
            Feature::WasteReports => "Waste reports",
            Feature::ApiAccess => "API access",
        })
    }
}

/// Fails when adding one more `resource` to `current_count` would exceed
/// the tier's cap.
pub fn check_capacity(
    tier: PlanTier,
    resource: Resource,
    current_count: u32,
) -> Result<(), PlanError> {
    match tier.limits().for_resource(resource) {
        Some(limit) if current_count >= limit => Err(PlanError::LimitReached {
            tier,
            resource,
            limit,
        }),
        _ => Ok(()),
    }
}

pub fn require_feature(tier: PlanTier, feature: Feature) -> Result<(), PlanError> {
    if tier.has_feature(feature) {
        Ok(())
    } else {
        Err(PlanError::FeatureUnavailable {
            tier,
            feature: feature.to_string(),
        })
    }
}
