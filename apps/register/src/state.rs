//! # Register State
//!
//! Everything a command needs: the database, the printer dispatcher and the
//! deployment config. Built once per process and passed to commands by
//! reference.
//!
//! ## Print Delivery
//! ```text
//! lines ──► escpos::encode(lines, cut) ──► dispatcher.dispatch(backend)
//!                                                  │
//!                          Ok ──► PrintStatus::Printed
//!                          Err ─► PrintStatus::Failed  (ledger untouched)
//! ```

use serde::Serialize;
use stand_core::SettingsSnapshot;
use stand_db::Database;
use stand_print::{escpos, PrintResult, PrinterDispatcher, ReceiptLayout};
use tracing::warn;

use crate::config::AppConfig;

/// Shared state for one register process.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub printer: PrinterDispatcher,
    pub config: AppConfig,
}

/// What happened to the slip of an operation that has already committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrintStatus {
    Printed { backend: String },
    Skipped,
    Failed { backend: String, error: String },
}

impl PrintStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, PrintStatus::Failed { .. })
    }
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        AppState {
            printer: PrinterDispatcher::new(config.printer_config()),
            db,
            config,
        }
    }

    /// Receipt layout for this operation's settings.
    pub fn layout(&self, settings: &SettingsSnapshot) -> ReceiptLayout {
        ReceiptLayout::new(self.config.store.name.clone(), settings.receipt_width)
    }

    /// Encodes `lines` and sends them to the configured backend.
    pub async fn print_lines(&self, settings: &SettingsSnapshot, lines: &[String]) -> PrintResult<()> {
        let bytes = escpos::encode(lines, true);
        self.printer.dispatch(&settings.printer_backend, &bytes).await
    }

    /// Like [`print_lines`](Self::print_lines), for slips of committed
    /// operations: a failure is reported, not returned.
    pub async fn print_after_commit(&self, settings: &SettingsSnapshot, lines: &[String]) -> PrintStatus {
        let backend = settings.printer_backend.clone();
        match self.print_lines(settings, lines).await {
            Ok(()) => PrintStatus::Printed { backend },
            Err(e) => {
                warn!(backend = %backend, error = %e, "Slip not printed; operation stays committed");
                PrintStatus::Failed {
                    backend,
                    error: e.to_string(),
                }
            }
        }
    }
}
