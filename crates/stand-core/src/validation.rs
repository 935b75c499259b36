//! # Validation Module
//!
//! Input validation utilities for Stand POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register CLI                                                 │
//! │  └── Argument parsing (clap), euro amount parsing                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + sale.rs                                        │
//! │  └── Business rule validation before a transaction starts              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (qty > 0), NOT NULL                                         │
//! │  ├── UNIQUE (order_reversals.original_order_id)                        │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::TaxRate;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest item name that is snapshotted into an order.
pub const MAX_LINE_NAME_LEN: usize = 200;

/// Accepted receipt widths in characters (58 mm paper is 32, 80 mm is 48).
pub const RECEIPT_WIDTH_RANGE: (usize, usize) = (16, 80);

/// Validates an item name before it is frozen into an order.
///
/// ## Example
/// ```rust
/// use stand_core::validation::validate_line_name;
///
/// assert!(validate_line_name("Cola 0.5L").is_ok());
/// assert!(validate_line_name("  ").is_err());
/// ```
pub fn validate_line_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_LINE_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_LINE_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a quantity value: must be positive.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use stand_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(350).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0 to 10000).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    TaxRate::try_from_bps(bps).map(|_| ())
}

/// Validates a deposit rate in cents per container.
pub fn validate_deposit_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "deposit_cents".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates the receipt width in characters.
pub fn validate_receipt_width(width: usize) -> ValidationResult<()> {
    let (min, max) = RECEIPT_WIDTH_RANGE;
    if width < min || width > max {
        return Err(ValidationError::OutOfRange {
            field: "receipt_width".to_string(),
            min: min as i64,
            max: max as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
