//! # Register Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Command Function  ──►  Result<T, AppError>                             │
//! │         │                                                               │
//! │         ├── LedgerError::AlreadyReversed ──► BUSINESS_RULE   exit 5    │
//! │         ├── LedgerError::Busy ─────────────► BUSY            exit 75   │
//! │         ├── CoreError::InsufficientTender ─► VALIDATION      exit 2    │
//! │         ├── PrintError::PrinterTimeout ────► PRINTER         exit 3    │
//! │         └── DbError::QueryFailed ──────────► DATABASE        exit 1    │
//! │                                                                         │
//! │  stderr:  error [BUSINESS_RULE]: Order 12 was already reversed ...     │
//! │  --json:  {"code":"BUSINESS_RULE","message":"Order 12 was ..."}        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Underlying causes are logged where they are converted; the message shown
//! to the operator stays short.

use std::fmt;
use std::process::ExitCode;

use serde::Serialize;
use stand_core::CoreError;
use stand_db::{DbError, LedgerError};
use stand_print::PrintError;

/// Error returned from register commands.
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes, each with its own process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad operator input or a rejected cart.
    Validation,

    /// Order, product or setting does not exist.
    NotFound,

    /// A ledger rule refused the operation (already reversed, no event).
    BusinessRule,

    /// The database stayed locked past the lock timeout. Safe to retry.
    Busy,

    /// The printer could not be reached or refused the job.
    Printer,

    /// Config file or environment is invalid.
    Config,

    /// Storage failure.
    Database,

    /// Anything else.
    Internal,
}

impl ErrorCode {
    /// Exit status for the process. `Busy` and `Config` use the sysexits
    /// values (`EX_TEMPFAIL`, `EX_CONFIG`).
    pub fn exit_status(self) -> u8 {
        match self {
            ErrorCode::Internal | ErrorCode::Database => 1,
            ErrorCode::Validation => 2,
            ErrorCode::Printer => 3,
            ErrorCode::NotFound => 4,
            ErrorCode::BusinessRule => 5,
            ErrorCode::Busy => 75,
            ErrorCode::Config => 78,
        }
    }
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl fmt::Display) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{entity} not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Validation, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Config, message)
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code.exit_status())
    }

    /// The line written to stderr when a command fails.
    pub fn report_line(&self) -> String {
        format!("error [{}]: {}", self.code, self.message)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_else(|| format!("{self:?}"));
        f.write_str(&code)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

/// Result type alias for register commands.
pub type AppResult<T> = Result<T, AppError>;

// =============================================================================
// Conversions
// =============================================================================

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidSetting { .. } => AppError::config(err.to_string()),
            _ => AppError::validation(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::EmptyCart
            | LedgerError::InvalidQuantity { .. }
            | LedgerError::InvalidLine { .. }
            | LedgerError::InvalidInput(_)
            | LedgerError::DepositMismatch { .. } => AppError::validation(err.to_string()),
            LedgerError::OrderNotFound(id) => AppError::not_found("Order", id),
            LedgerError::NoActiveEvent
            | LedgerError::AlreadyReversed { .. }
            | LedgerError::CannotReverseReversal(_) => {
                AppError::new(ErrorCode::BusinessRule, err.to_string())
            }
            LedgerError::Busy => AppError::new(ErrorCode::Busy, err.to_string()),
            LedgerError::Persistence(e) => AppError::from(e),
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AppError::not_found(&entity, id),
            DbError::UniqueViolation { .. }
            | DbError::InvalidValue(_)
            | DbError::BackupTargetExists(_) => {
                AppError::validation(err.to_string())
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                AppError::validation("Invalid reference")
            }
            DbError::Busy | DbError::PoolExhausted => {
                AppError::new(ErrorCode::Busy, "Database is busy, try again")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                AppError::new(ErrorCode::Database, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                AppError::new(ErrorCode::Database, "Database migration failed")
            }
            DbError::QueryFailed(e) | DbError::Internal(e) => {
                tracing::error!("Database operation failed: {}", e);
                AppError::new(ErrorCode::Database, "Database operation failed")
            }
        }
    }
}

impl From<PrintError> for AppError {
    fn from(err: PrintError) -> Self {
        tracing::warn!(error = %err, "Print job failed");
        AppError::new(ErrorCode::Printer, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::new(ErrorCode::Internal, err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::config(format!("Invalid config file: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_to_codes() {
        let err = AppError::from(LedgerError::AlreadyReversed {
            order_id: 12,
            reversal_order_id: 13,
        });
        assert_eq!(err.code, ErrorCode::BusinessRule);
        assert!(err.message.contains("12"));

        assert_eq!(AppError::from(LedgerError::Busy).code, ErrorCode::Busy);
        assert_eq!(AppError::from(LedgerError::EmptyCart).code, ErrorCode::Validation);
        assert_eq!(
            AppError::from(LedgerError::OrderNotFound(7)).message,
            "Order not found: 7"
        );
        assert_eq!(
            AppError::from(LedgerError::Persistence(DbError::QueryFailed("x".into()))).code,
            ErrorCode::Database
        );
    }

    #[test]
    fn test_print_error_is_printer_code() {
        let err = AppError::from(PrintError::UnknownBackend("lpt1".into()));
        assert_eq!(err.code, ErrorCode::Printer);
        assert!(err.message.contains("lpt1"));
    }

    #[test]
    fn test_exit_status_and_display() {
        assert_eq!(ErrorCode::Busy.exit_status(), 75);
        assert_eq!(ErrorCode::Validation.exit_status(), 2);

        let err = AppError::validation("Cart is empty");
        assert_eq!(err.to_string(), "[VALIDATION] Cart is empty");
        assert_eq!(err.report_line(), "error [VALIDATION]: Cart is empty");
        let err = AppError::new(ErrorCode::BusinessRule, "Order 12 was already reversed");
        assert_eq!(
            err.report_line(),
            "error [BUSINESS_RULE]: Order 12 was already reversed"
        );
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"code":"VALIDATION","message":"Cart is empty"}"#
        );
    }
}
