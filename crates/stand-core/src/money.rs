//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0,1 € + 0,2 € = 0,30000000000000004 €  ❌ WRONG!                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    10 + 20 = 30 cents, always                                           │
//! │                                                                         │
//! │  Totals, deposit refunds and reversals are ALL computed on i64 cents.   │
//! │  Floating point never appears in a stored amount.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stand_core::money::Money;
//!
//! let pommes = Money::from_cents(350);
//! let line = pommes.checked_mul_qty(2).unwrap();
//! assert_eq!(line.cents(), 700);
//! assert_eq!(line.to_string(), "7,00 €");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in euro cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: reversal orders carry negative totals
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Checked helpers**: ledger code uses `checked_*` so an absurd cart is
///   rejected instead of wrapping around
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-euro portion (truncated towards zero).
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cent portion (always 0-99).
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

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use stand_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(250).checked_mul_qty(3), Some(Money::from_cents(750)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul_qty(2), None);
    /// ```
    #[inline]
    pub const fn checked_mul_qty(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Tax contained in a gross (tax-inclusive) amount.
    ///
    /// Stand prices are gross prices, so receipts show the VAT share that is
    /// already included: `gross * bp / (10000 + bp)`, rounded half away from
    /// zero.
    ///
    /// ## Example
    /// ```rust
    /// use stand_core::money::Money;
    /// use stand_core::types::TaxRate;
    ///
    /// // 2,50 € at 19 % contains 0,40 € VAT (39.9 cents rounded)
    /// let tax = Money::from_cents(250).included_tax(TaxRate::from_bps(1900));
    /// assert_eq!(tax.cents(), 40);
    /// ```
    pub fn included_tax(&self, rate: TaxRate) -> Money {
        if rate.is_zero() {
            return Money::zero();
        }
        let bps = rate.bps() as i128;
        let numerator = self.0 as i128 * bps;
        let denominator = 10_000 + bps;
        let half = denominator / 2;
        let rounded = if numerator >= 0 {
            (numerator + half) / denominator
        } else {
            (numerator - half) / denominator
        };
        Money(rounded as i64)
    }

    /// Parses an operator-entered euro amount.
    ///
    /// Accepts German notation with optional thousands dots and euro sign:
    /// `"12,50 €"`, `"12"`, `"1.234,5"`, `"-0,50"`. At most two decimal
    /// places are allowed. Integer arithmetic only.
    ///
    /// ## Example
    /// ```rust
    /// use stand_core::money::Money;
    ///
    /// assert_eq!(Money::parse_euro("12,50 €").unwrap().cents(), 1250);
    /// assert_eq!(Money::parse_euro("1.234,5").unwrap().cents(), 123450);
    /// assert!(Money::parse_euro("1,234").is_err());
    /// ```
    pub fn parse_euro(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let cleaned: String = input
            .trim()
            .trim_end_matches('€')
            .trim()
            .chars()
            .filter(|c| *c != '.')
            .collect();

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, cleaned.as_str()),
        };

        let (whole, fraction) = match digits.split_once(',') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("only digits, ',' and '.' are allowed"));
        }
        if fraction.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }

        let euros: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("bad cents"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("bad cents"))?,
        };

        let total = euros
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -total } else { total }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// German euro display: `3,50 €`, `-0,50 €`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{},{:02} €", sign, self.euros().abs(), self.cents_part())
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

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
