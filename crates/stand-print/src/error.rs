//! # Print Error Types
//!
//! Every way a receipt can fail to reach paper.
//!
//! A print error never touches the ledger: by the time a receipt is
//! dispatched the sale is already committed, and the operator can reprint.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Printer path failures.
#[derive(Debug, Error)]
pub enum PrintError {
    /// The device file could not be opened for writing.
    #[error("Cannot open printer device {}: {source}", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The device accepted the open but the write failed.
    #[error("Write to printer device {} failed: {source}", path.display())]
    DeviceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The spooler could not be started or exited unsuccessfully.
    #[error("Print spooler failed for queue '{queue}': {reason}")]
    Spool { queue: String, reason: String },

    /// The spooler did not finish within the configured timeout.
    #[error("Printer '{backend}' did not respond within {timeout:?}")]
    PrinterTimeout { backend: String, timeout: Duration },

    /// A recognised backend that this build cannot drive.
    #[error("Printer backend '{backend}' is not supported: {hint}")]
    UnsupportedBackend { backend: String, hint: String },

    /// The backend string matches no known form.
    #[error("Unknown printer backend '{0}'")]
    UnknownBackend(String),
}

impl PrintError {
    /// True when the printer setting itself is wrong, as opposed to the
    /// printer being offline.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PrintError::UnsupportedBackend { .. } | PrintError::UnknownBackend(_)
        )
    }
}

/// Result type for print operations.
pub type PrintResult<T> = Result<T, PrintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_backend() {
        let err = PrintError::UnknownBackend("lpt1".to_string());
        assert_eq!(err.to_string(), "Unknown printer backend 'lpt1'");
        assert!(err.is_configuration());

        let err = PrintError::PrinterTimeout {
            backend: "cups:EPSON".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("cups:EPSON"));
        assert!(!err.is_configuration());
    }
}
