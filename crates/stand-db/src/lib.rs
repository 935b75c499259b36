//! # stand-db: Ledger & Storage Layer for Stand POS
//!
//! This crate owns the SQLite database: connection pool, migrations and the
//! transactional ledger that records sales, deposit refunds and reversals.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stand POS Data Flow                              │
//! │                                                                         │
//! │  Register command (sell / refund-deposit / reverse)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     stand-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ LedgerService │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ EventRepo     │    │ 001_initial  │  │   │
//! │  │   │ WAL + busy    │    │ SettingsRepo  │    │   + seeds    │  │   │
//! │  │   │ timeout       │    │ ProductRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/stand-pos/stand.db (shared by all registers)  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Ledger service and repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stand_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stand.db")).await?;
//!
//! let sale = db.ledger().create_sale(PaymentMethod::Cash, &lines).await?;
//! let snapshot = db.settings().snapshot().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::event::EventRepository;
pub use repository::ledger::LedgerService;
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::settings::SettingsRepository;
