//! # Money Module
//!
//! Provides the `Money` type used for unit costs and inventory value.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing unit_cost × quantity with floats over a few thousand vials:   │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │    error accumulates with every line                                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "45.00" is parsed straight into 4500 cents, never through f64       │
//! │    totals are exact no matter how many items are summed                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use clinicstock_core::money::Money;
//!
//! let unit_cost: Money = "45.00".parse().unwrap();
//! assert_eq!(unit_cost.cents(), 4500);
//!
//! let stock_value = unit_cost.multiply_quantity(5);
//! assert_eq!(stock_value.to_string(), "$225.00");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Arithmetic saturates at the `i64` bounds instead of wrapping; a clinic
/// would need more than 90 quadrillion dollars of stock to notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use clinicstock_core::money::Money;
    ///
    /// let cost = Money::from_cents(1099); // $10.99
    /// assert_eq!(cost.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Value of `qty` units at this unit cost.
    ///
    /// The product is formed in `i128` and saturated back into `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use clinicstock_core::money::Money;
    ///
    /// let unit_cost = Money::from_cents(299);
    /// assert_eq!(unit_cost.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(saturate(self.0 as i128 * qty as i128))
    }

    /// Parses a decimal string such as `"45"`, `"45.5"` or `"45.00"`.
    ///
    /// ## Rules
    /// - Optional leading `$` and surrounding whitespace are ignored
    /// - At most two fractional digits (costs are stored in cents)
    /// - Negative amounts are rejected; costs are never below zero
    pub fn parse_decimal(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "unit_cost".to_string(),
            reason: reason.to_string(),
        };

        let raw = input.trim();
        let raw = raw.strip_prefix('$').unwrap_or(raw);
        if raw.is_empty() {
            return Err(ValidationError::Required {
                field: "unit_cost".to_string(),
            });
        }
        if raw.starts_with('-') {
            return Err(ValidationError::MustNotBeNegative {
                field: "unit_cost".to_string(),
            });
        }

        let (whole, fraction) = match raw.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (raw, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a decimal number"));
        }
        if fraction.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let mut minor: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid("must be a decimal number"))?
        };
        if fraction.len() == 1 {
            minor *= 10;
        }

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .map(Money)
            .ok_or_else(|| invalid("amount too large"))
    }

    /// Renders the amount as a plain decimal string (`"1234.50"`).
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

#[inline]
fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Human-readable dollars; the dashboard formats its own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_decimal(s)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// Serde adapter that writes a [`Money`] as a JSON number of dollars.
///
/// Whole amounts go out as integers (`25`), others as the shortest float
/// that round-trips two decimals (`12.34`). Reading accepts numbers or
/// decimal strings and goes through [`Money::parse_decimal`], so no value
/// with more than two decimals gets in.
///
/// ```rust,ignore
/// #[serde(with = "crate::money::dollars")]
/// pub total_value: Money,
/// ```
pub mod dollars {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        if value.cents_part() == 0 {
            serializer.serialize_i64(value.dollars())
        } else {
            serializer.serialize_f64(value.cents() as f64 / 100.0)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(DollarsVisitor)
    }

    struct DollarsVisitor;

    impl<'de> Visitor<'de> for DollarsVisitor {
        type Value = Money;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative dollar amount with at most two decimals")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
            self.visit_str(&v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
            self.visit_str(&v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
            if !v.is_finite() {
                return Err(E::custom("dollar amount must be finite"));
            }
            self.visit_str(&v.to_string())
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
            Money::parse_decimal(v).map_err(E::custom)
        }
    }
}

/// [`dollars`] for fields that store raw cents as `i64`.
pub mod cents_as_dollars {
    use super::*;

    pub fn serialize<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        dollars::serialize(&Money::from_cents(*cents), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        dollars::deserialize(deserializer).map(|money| money.cents())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
