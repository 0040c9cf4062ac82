//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A ledger that sums hundreds of sales and costs with floats slowly      │
//! │  drifts away from what the farmer actually earned.                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    "10,50" parses to 1050 centavos. Exact, always.                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use safra_core::money::Money;
//!
//! // Create from centavos (preferred)
//! let price = Money::from_centavos(1050); // 10.50
//!
//! // Or parse user input; both decimal separators are accepted
//! let same = Money::parse("10,50").unwrap();
//! assert_eq!(price, same);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: net profit/loss can legitimately be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for ledger payloads and remote rows
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► Sale.total (price × quantity, frozen at sale time)
/// Cost.amount  ──► report totals ──► net profit/loss
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos (the smallest currency unit).
    ///
    /// ## Why Centavos?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// The store, calculations, and remote rows all use centavos.
    /// Only a display layer converts to a formatted string.
    #[inline]
    pub const fn from_centavos(centavos: i64) -> Self {
        Money(centavos)
    }

    /// Returns the value in centavos (smallest currency unit).
    #[inline]
    pub const fn centavos(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn whole_part(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cent_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use safra_core::money::Money;
    ///
    /// let unit_price = Money::from_centavos(250); // 2.50
    /// let total = unit_price.multiply_quantity(3);
    /// assert_eq!(total.centavos(), 750); // 7.50
    /// ```
    ///
    /// This is how a sale total is frozen: unit price at sale time times
    /// quantity, computed once and never revisited.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Parses a user-entered amount into Money.
    ///
    /// ## Accepted Input
    /// ```text
    /// "10"      → 1000 centavos
    /// "10.5"    → 1050 centavos
    /// "10.50"   → 1050 centavos
    /// "10,50"   → 1050 centavos   (comma decimal separator)
    /// ```
    ///
    /// ## Rejected Input
    /// - empty / whitespace-only strings
    /// - anything non-numeric
    /// - negative amounts
    /// - more than two decimal places (cannot be represented in centavos)
    ///
    /// ## Why No Floats?
    /// `"10,50".replace(',', '.').parse::<f64>()` would work until it
    /// doesn't. The digits are split on the separator and combined with
    /// integer arithmetic instead.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        if input.starts_with('-') {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            });
        }

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        // Both separators are in everyday use; exactly one is allowed.
        let mut parts = input.splitn(3, |c| c == '.' || c == ',');
        let whole = parts.next().unwrap_or("");
        let fraction = parts.next();
        if parts.next().is_some() {
            return Err(invalid("more than one decimal separator"));
        }

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a number like 10.50"));
        }

        let whole: i64 = whole
            .parse()
            .map_err(|_| invalid("amount is too large"))?;

        let fraction_centavos = match fraction {
            None | Some("") => 0,
            Some(f) if f.len() <= 2 && f.chars().all(|c| c.is_ascii_digit()) => {
                // "5" means 50 centavos, "50" means 50 centavos
                let digits: i64 = f.parse().map_err(|_| invalid("must be a number"))?;
                if f.len() == 1 {
                    digits * 10
                } else {
                    digits
                }
            }
            Some(_) => return Err(invalid("at most two decimal places")),
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction_centavos))
            .map(Money)
            .ok_or_else(|| invalid("amount is too large"))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for reports and debugging. Locale-aware currency formatting
/// belongs to a display layer, not here.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.whole_part().abs(), self.cent_part())
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
