//! # Error Types
//!
//! Domain-specific error types for stand-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stand-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations (cart, deposit)       │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  stand-db errors                                                       │
//! │  ├── DbError          - Storage failures                               │
//! │  └── LedgerError      - What a ledger operation reports                │
//! │                                                                         │
//! │  stand-print errors                                                    │
//! │  └── PrintError       - Printer path failures                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → AppError → CLI      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations detected before anything is written.
///
/// All of these are caller mistakes: they are reported, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A sale needs at least one cart line.
    #[error("Cart is empty")]
    EmptyCart,

    /// Quantities of sale lines and deposit refunds must be positive.
    #[error("Quantity must be positive, got {qty}")]
    InvalidQuantity { qty: i64 },

    /// A cart line failed validation (negative price, tax out of range,
    /// arithmetic overflow).
    #[error("Invalid cart line {index}: {reason}")]
    InvalidLine { index: usize, reason: String },

    /// The refund amount does not equal quantity × deposit rate.
    #[error("Deposit amount {amount_cents} does not match {qty} × rate ({expected_cents})")]
    DepositMismatch {
        qty: i64,
        amount_cents: i64,
        expected_cents: i64,
    },

    /// Cash handed over does not cover the order total.
    #[error("Tendered {tendered_cents} cents does not cover total {total_cents} cents")]
    InsufficientTender {
        total_cents: i64,
        tendered_cents: i64,
    },

    /// A settings value could not be interpreted.
    #[error("Setting '{key}' has invalid value '{value}': {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. an unparsable euro amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(CoreError::EmptyCart.to_string(), "Cart is empty");
        assert_eq!(
            CoreError::InvalidQuantity { qty: -1 }.to_string(),
            "Quantity must be positive, got -1"
        );
        let err = CoreError::DepositMismatch {
            qty: 3,
            amount_cents: 100,
            expected_cents: 150,
        };
        assert_eq!(
            err.to_string(),
            "Deposit amount 100 does not match 3 × rate (150)"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
