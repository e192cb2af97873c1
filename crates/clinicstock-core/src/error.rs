//! # Error Types
//!
//! Domain-specific error types for clinicstock-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  clinicstock-core errors (this file)                                   │
//! │  ├── CoreError           - Umbrella for everything below               │
//! │  ├── DataIntegrityError  - Stored record is missing/malformed          │
//! │  ├── ValidationError     - User input failures                         │
//! │  └── PlanError           - Subscription tier gating failures           │
//! │                                                                         │
//! │  clinicstock-db errors (separate crate)                                │
//! │  └── DbError             - Database failures, wraps CoreError          │
//! │                                                                         │
//! │  Flow: DataIntegrityError → CoreError → DbError → route handler        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The status engine never recovers from a [`DataIntegrityError`]; it is
//! returned to the caller, which decides how to present it.

use thiserror::Error;

use crate::plan::{PlanTier, Resource};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stored record could not be used (missing or malformed field).
    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Subscription tier does not allow the operation.
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Stock adjustment would take the quantity below zero.
    ///
    /// ## When This Occurs
    /// - Recording usage of more units than are on the shelf
    #[error("Insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },
}

// =============================================================================
// Data Integrity Error
// =============================================================================

/// A record handed to the engine by the persistence layer is unusable.
///
/// Classification is all-or-nothing per item: one of these aborts the
/// evaluation and no partial status is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    /// A required field is absent.
    #[error("{entity} {id} is missing required field {field}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
        id: String,
    },

    /// A field is present but cannot be interpreted.
    ///
    /// `field` is owned because storage reports the offending column by
    /// name at runtime.
    #[error("{entity} field {field} is malformed: {reason}")]
    Malformed {
        entity: &'static str,
        field: String,
        reason: String,
    },

    /// A field that must be non-negative holds a negative value.
    #[error("{entity} field {field} must not be negative (got {value})")]
    Negative {
        entity: &'static str,
        field: &'static str,
        value: i64,
    },
}

impl DataIntegrityError {
    pub fn missing(entity: &'static str, field: &'static str, id: impl Into<String>) -> Self {
        DataIntegrityError::MissingField {
            entity,
            field,
            id: id.into(),
        }
    }

    pub fn malformed(
        entity: &'static str,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        DataIntegrityError::Malformed {
            entity,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements, before anything
/// is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid money string).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Plan Error
// =============================================================================

/// Subscription tier gating failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Adding one more resource would exceed the tier's limit.
    #[error("{tier} plan allows at most {limit} {resource}")]
    LimitReached {
        tier: PlanTier,
        resource: Resource,
        limit: u32,
    },

    /// The tier does not include the requested feature.
    #[error("{feature} is not available on the {tier} plan")]
    FeatureUnavailable { tier: PlanTier, feature: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_integrity_messages() {
        let err = DataIntegrityError::missing("item", "expiration_date", "abc");
        assert_eq!(
            err.to_string(),
            "item abc is missing required field expiration_date"
        );

        let err = DataIntegrityError::Negative {
            entity: "settings",
            field: "low_stock_threshold",
            value: -2,
        };
        assert_eq!(
            err.to_string(),
            "settings field low_stock_threshold must not be negative (got -2)"
        );
    }

    #[test]
    fn test_plan_error_message() {
        let err = PlanError::LimitReached {
            tier: PlanTier::Free,
            resource: Resource::Locations,
            limit: 1,
        };
        assert_eq!(err.to_string(), "free plan allows at most 1 locations");
    }

    #[test]
    fn test_conversions_into_core_error() {
        let core: CoreError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(core, CoreError::Validation(_)));

        let core: CoreError = DataIntegrityError::missing("item", "quantity", "x").into();
        assert!(matches!(core, CoreError::DataIntegrity(_)));
    }
}
