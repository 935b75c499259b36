//! # Database Error Types
//!
//! Error types for storage and ledger operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          CoreError (cart / deposit rules)  │
//! │       │                                    │                            │
//! │       ▼                                    │                            │
//! │  DbError ← categorized (busy, unique, FK)  │                            │
//! │       │                                    │                            │
//! │       ▼                                    ▼                            │
//! │  LedgerError (this module) ← what a ledger operation reports           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppError (register CLI) ← exit code + operator message                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stand_core::CoreError;
use thiserror::Error;

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and sort them into the categories the
/// ledger cares about.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Second reversal link for the same original order
    /// - Second active event
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Order item referencing a non-existent product
    /// - Order referencing a non-existent event
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The write lock could not be taken within the busy timeout.
    ///
    /// Another connection held the database for longer than
    /// `DbConfig::lock_timeout`. Nothing was written; retrying is safe.
    #[error("Database is busy")]
    Busy,

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored value could not be interpreted (malformed setting).
    #[error("Invalid stored value: {0}")]
    InvalidValue(#[source] CoreError),

    /// A backup would overwrite an existing file.
    #[error("Backup target already exists: {0}")]
    BackupTargetExists(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True when the failure is about contention, not about the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Busy | DbError::PoolExhausted)
    }
}

/// SQLITE_BUSY and SQLITE_LOCKED, including their extended codes
/// (e.g. 517 = SQLITE_BUSY_SNAPSHOT).
fn is_lock_code(code: &str) -> bool {
    code.parse::<i32>()
        .map(|c| matches!(c & 0xff, 5 | 6))
        .unwrap_or(false)
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → busy/locked code, else analyze message
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if db_err.code().as_deref().is_some_and(is_lock_code)
                    || msg.contains("database is locked")
                {
                    return DbError::Busy;
                }

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Ledger Error
// =============================================================================

/// What a ledger operation reports to its caller.
///
/// ## Categories
/// ```text
/// Caller mistakes (report, never retry):
///   EmptyCart, InvalidQuantity, InvalidLine, InvalidInput, DepositMismatch,
///   OrderNotFound, AlreadyReversed, CannotReverseReversal
/// Configuration (operator action needed):
///   NoActiveEvent
/// Contention (retry is safe, nothing was written):
///   Busy
/// Storage (transaction rolled back):
///   Persistence
/// ```
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Quantity must be positive, got {qty}")]
    InvalidQuantity { qty: i64 },

    /// A cart line failed validation (price, tax rate, name, overflow).
    #[error("Invalid cart line {index}: {reason}")]
    InvalidLine { index: usize, reason: String },

    /// Any other amount rule violation.
    #[error("Invalid input: {0}")]
    InvalidInput(CoreError),

    /// The event table has no active row. Seeded at migration time, so this
    /// means someone edited the table by hand.
    #[error("No active event configured")]
    NoActiveEvent,

    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Order {order_id} was already reversed by order {reversal_order_id}")]
    AlreadyReversed {
        order_id: i64,
        reversal_order_id: i64,
    },

    #[error("Order {0} is itself a reversal and cannot be reversed")]
    CannotReverseReversal(i64),

    #[error("Deposit amount {amount_cents} does not match {qty} × rate ({expected_cents})")]
    DepositMismatch {
        qty: i64,
        amount_cents: i64,
        expected_cents: i64,
    },

    /// The write lock was not granted in time. Nothing was written.
    #[error("Database is busy, try again")]
    Busy,

    /// Storage failure; the transaction was rolled back.
    #[error("Persistence failed: {0}")]
    Persistence(DbError),
}

impl LedgerError {
    /// True when repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Busy)
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyCart => LedgerError::EmptyCart,
            CoreError::InvalidQuantity { qty } => LedgerError::InvalidQuantity { qty },
            CoreError::InvalidLine { index, reason } => LedgerError::InvalidLine { index, reason },
            CoreError::DepositMismatch {
                qty,
                amount_cents,
                expected_cents,
            } => LedgerError::DepositMismatch {
                qty,
                amount_cents,
                expected_cents,
            },
            other => LedgerError::InvalidInput(other),
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        if err.is_retryable() {
            LedgerError::Busy
        } else {
            LedgerError::Persistence(err)
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_codes() {
        assert!(is_lock_code("5"));
        assert!(is_lock_code("517"));
        assert!(is_lock_code("261"));
        assert!(is_lock_code("6"));
        assert!(!is_lock_code("19"));
        assert!(!is_lock_code("2067"));
        assert!(!is_lock_code("nope"));
    }

    #[test]
    fn test_core_errors_map_to_ledger_categories() {
        assert!(matches!(
            LedgerError::from(CoreError::EmptyCart),
            LedgerError::EmptyCart
        ));
        assert!(matches!(
            LedgerError::from(CoreError::InvalidQuantity { qty: 0 }),
            LedgerError::InvalidQuantity { qty: 0 }
        ));
        assert!(matches!(
            LedgerError::from(CoreError::InvalidLine {
                index: 1,
                reason: "price".to_string()
            }),
            LedgerError::InvalidLine { index: 1, .. }
        ));
        assert!(matches!(
            LedgerError::from(CoreError::InsufficientTender {
                total_cents: 950,
                tendered_cents: 500
            }),
            LedgerError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_busy_is_the_only_retryable_ledger_error() {
        assert!(LedgerError::from(DbError::Busy).is_retryable());
        assert!(LedgerError::from(DbError::PoolExhausted).is_retryable());

        let err = LedgerError::from(DbError::QueryFailed("syntax".to_string()));
        assert!(matches!(err, LedgerError::Persistence(_)));
        assert!(!err.is_retryable());
        assert!(!LedgerError::NoActiveEvent.is_retryable());
    }
}
