//! # Domain Types
//!
//! Core domain types used throughout Stand POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Event       │   │      Order      │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  event_id       │◄──│  order_id       │       │
//! │  │  name           │   │  total_cents    │   │  name (frozen)  │       │
//! │  │  active         │   │  payment_method │   │  unit_cents     │       │
//! │  └─────────────────┘   └────────┬────────┘   │  qty, line      │       │
//! │          ▲                      │            └─────────────────┘       │
//! │          │             ┌────────┴────────┐   ┌─────────────────┐       │
//! │  ┌───────┴─────────┐   │  OrderReversal  │   │    Product      │       │
//! │  │  DepositRefund  │   │  ─────────────  │   │  (catalog,      │       │
//! │  │  qty, amount    │   │  original (1x)  │   │   read-only)    │       │
//! │  └─────────────────┘   │  reversal       │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row identifiers are SQLite `INTEGER PRIMARY KEY` values; the receipt
//! prints them as `Order #<id>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01 %, so 700 bps = 7 % (food) and 1900 bps = 19 %
/// (drinks). Valid range is 0..=10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Upper bound: 100 %.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a tax rate from basis points without range checking.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate, rejecting values above 100 %.
    pub fn try_from_bps(bps: u32) -> Result<Self, ValidationError> {
        if bps > Self::MAX_BPS {
            return Err(ValidationError::OutOfRange {
                field: "tax_rate".to_string(),
                min: 0,
                max: Self::MAX_BPS as i64,
            });
        }
        Ok(TaxRate(bps))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Receipt label: `7 %`, `19 %`, `8,25 %`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{} %", whole)
        } else if frac % 10 == 0 {
            write!(f, "{},{} %", whole, frac / 10)
        } else {
            write!(f, "{},{:02} %", whole, frac)
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How an order was paid. Stored as `CASH` / `CARD`.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Cash in the till.
    Cash,
    /// Card on an external terminal.
    Card,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the stored names plus the German till labels (`bar`, `karte`).
impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "bar" => Ok(PaymentMethod::Cash),
            "card" | "karte" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".to_string(), "card".to_string()],
            }),
        }
    }
}

// =============================================================================
// Event
// =============================================================================

/// A sales session (market day, exhibition). Every order and refund belongs
/// to the event that was active when it was written.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product. Owned by catalog management; the ledger only reads it
/// and snapshots name, price and tax rate into order items.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Gross price in cents.
    pub price_cents: i64,
    /// Tax rate in basis points (700 = 7 %).
    pub tax_rate_bp: u32,
    pub category: Option<String>,
    pub active: bool,
    pub color_hex: Option<String>,
    pub symbol: Option<String>,
    /// Deposit ("Pfand") products are sold like any other line.
    pub is_deposit: bool,
    pub event_id: Option<i64>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bp)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A committed sale (or the counter-order of a reversal).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Sum of all item line totals. Negative for reversal orders.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub event_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of an order. Uses the snapshot pattern: name, price and tax are
/// frozen at sale time so catalog edits never rewrite history.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub name: String,
    pub unit_cents: i64,
    pub qty: i64,
    pub tax_rate_bp: u32,
    /// unit_cents × qty
    pub line_cents: i64,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bp)
    }
}

// =============================================================================
// Order Reversal
// =============================================================================

/// Links an original order to the counter-order that cancels it ("Storno").
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReversal {
    pub id: i64,
    pub original_order_id: i64,
    pub reversal_order_id: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Deposit Refund
// =============================================================================

/// Returned containers paid out at the stand.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRefund {
    pub id: i64,
    pub qty: i64,
    pub amount_cents: i64,
    pub event_id: i64,
    pub created_at: DateTime<Utc>,
}

impl DepositRefund {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Setting
// =============================================================================

/// A raw key/value row of the settings table.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

// =============================================================================
// Operation Results
// =============================================================================

/// Outcome of a committed sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleResult {
    pub order_id: i64,
    pub total: Money,
}

/// Outcome of a committed reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalResult {
    pub original_order_id: i64,
    pub reversal_order_id: i64,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
