//! # stand-print: Receipts for Stand POS
//!
//! Lays out receipt text, encodes it as ESC/POS and delivers it to the
//! configured printer backend.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Order + items ──► receipt::sale_receipt ──► Vec<String>               │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                    escpos::encode(lines, cut) ──► Vec<u8>  (pure)      │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │  "cups:EPSON" ──► PrinterDispatcher::dispatch ──► device / lp / sink  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`receipt`] - Slip layouts (sale, reversal, deposit, test page)
//! - [`escpos`] - Byte-exact ESC/POS encoding with CP1252 text
//! - [`backend`] - Parsing of the `printer_backend` setting
//! - [`dispatcher`] - Async delivery with spooler timeouts
//! - [`error`] - Print error types

pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod escpos;
pub mod receipt;

pub use backend::{Backend, UsbId};
pub use dispatcher::{PrinterConfig, PrinterDispatcher, TestSink};
pub use error::{PrintError, PrintResult};
pub use receipt::{ReceiptLayout, Tender};
