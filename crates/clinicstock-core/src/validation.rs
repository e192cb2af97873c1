//! # Validation Module
//!
//! Input validation for records before they are written.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard form                                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation (ValidationError)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign keys                                                      │
//! │                                                                         │
//! │  Anything that slips past all three surfaces at read time as a         │
//! │  DataIntegrityError from the status engine.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::NewItem;
use crate::{MAX_NAME_LENGTH, MAX_WARNING_DAYS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (item, category, location, organization).
///
/// ## Example
/// ```rust
/// use clinicstock_core::validation::validate_name;
///
/// assert!(validate_name("name", "Botox 100U").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates an optional SKU: 1-50 letters, digits, hyphens, underscores.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Minimal e-mail shape check; delivery is the auth provider's problem.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        }),
    }
}

pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Warning window must be 0..=MAX_WARNING_DAYS.
pub fn validate_warning_days(days: i64) -> ValidationResult<()> {
    if !(0..=MAX_WARNING_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "expiration_warning_days".to_string(),
            min: 0,
            max: MAX_WARNING_DAYS,
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a new or replacement item and returns its parsed unit cost.
pub fn validate_new_item(item: &NewItem) -> ValidationResult<Money> {
    validate_name("name", &item.name)?;
    if let Some(sku) = &item.sku {
        validate_sku(sku)?;
    }
    validate_non_negative("quantity", item.quantity)?;
    if let Some(threshold) = item.reorder_threshold {
        validate_non_negative("reorder_threshold", threshold)?;
    }
    Money::parse_decimal(&item.unit_cost)
}

// =============================================================================
// Unit Tests
// =============================================================================
