//! # Money Module
//!
//! Daily rates and rental totals as integer cents.
//!
//! ## Where Money Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Equipment.price_cents ──► quote_total(rate, start, end)               │
//! │         │                          │                                    │
//! │         │                          ▼                                    │
//! │         │              RentalRequest.total_price_cents                  │
//! │         │                                                               │
//! │         └──► price chips (under-50, 50-100, ...) ──► search results    │
//! │                                                                         │
//! │  Floats never enter the pipeline: $75.00 × 2 days is 7500 × 2 cents.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rigshare_core::money::Money;
//!
//! let rate = Money::from_dollars(75);
//! assert_eq!(rate.cents(), 7500);
//! assert_eq!(rate.times_days(2).unwrap().to_string(), "$150.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in US cents.
///
/// Serializes as a bare integer, so `priceCents: 7500` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use rigshare_core::money::Money;
    ///
    /// let rate = Money::from_cents(4500); // $45.00/day lens
    /// assert_eq!(rate.cents(), 4500);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole dollars.
    ///
    /// Filter chip thresholds are expressed this way.
    #[inline]
    pub const fn from_dollars(dollars: i64) -> Self {
        Money(dollars * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is strictly greater than zero.
    ///
    /// Listing prices must satisfy this.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies a daily rate by a day count.
    ///
    /// Returns `None` on overflow rather than wrapping.
    ///
    /// ## Example
    /// ```rust
    /// use rigshare_core::money::Money;
    ///
    /// let tripod = Money::from_cents(2500);
    /// assert_eq!(tripod.times_days(3).unwrap().cents(), 7500);
    /// assert!(Money::from_cents(i64::MAX).times_days(2).is_none());
    /// ```
    #[inline]
    pub fn times_days(&self, days: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(days)).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Formats as `$150.00` (debugging and message text, not localized UI).
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

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Money(cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
