//! # stand-core: Pure Business Logic for Stand POS
//!
//! This crate holds the rules of the stand's ledger as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stand POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/register (CLI)                          │   │
//! │  │    sell, refund-deposit, reverse, reprint, test-print          │   │
//! │  └───────────────┬─────────────────────────────┬───────────────────┘   │
//! │                  │                             │                        │
//! │  ┌───────────────▼─────────────┐  ┌────────────▼────────────────────┐  │
//! │  │  stand-db                   │  │  stand-print                    │  │
//! │  │  LedgerService, EventScope, │  │  ESC/POS encoder, receipt      │  │
//! │  │  ConfigStore (SQLite)       │  │  lines, PrinterDispatcher      │  │
//! │  └───────────────┬─────────────┘  └────────────┬────────────────────┘  │
//! │                  │                             │                        │
//! │  ┌───────────────▼─────────────────────────────▼───────────────────┐   │
//! │  │               ★ stand-core (THIS CRATE) ★                       │   │
//! │  │   types • money • sale math • settings snapshot • validation   │   │
//! │  │   NO I/O • NO DATABASE • NO DEVICES • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Event, Product, Order, OrderItem, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`sale`] - Cart lines, totals, reversal mirroring, deposit math
//! - [`settings`] - Immutable settings snapshot and known keys
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stand_core::sale::{validate_cart, CartLine};
//! use stand_core::types::TaxRate;
//!
//! let cart = vec![CartLine::new("Pommes", 350, 2, TaxRate::from_bps(700))];
//! let total = validate_cart(&cart).unwrap();
//! assert_eq!(total.to_string(), "7,00 €");
//! ```

pub mod error;
pub mod money;
pub mod sale;
pub mod settings;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale::CartLine;
pub use settings::SettingsSnapshot;
pub use types::*;

/// Name of the event the schema seeds when none is active.
pub const DEFAULT_EVENT_NAME: &str = "Standard";
