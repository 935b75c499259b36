//! # Repository Module
//!
//! Database access for the stand ledger.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Register command                                                      │
//! │       │                                                                 │
//! │       │  db.ledger().create_sale(Cash, &lines)                         │
//! │       ▼                                                                 │
//! │  LedgerService ──── uses ────► event::active_event_id_in(&mut tx)      │
//! │  ├── create_sale                                                        │
//! │  ├── refund_deposit / refund_deposit_at_rate / checked_refund          │
//! │  └── reverse_order                                                      │
//! │                                                                         │
//! │  SettingsRepository   get / set / snapshot                             │
//! │  ProductRepository    catalog lookups + default seed                   │
//! │  EventRepository      active event                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`LedgerService`](ledger::LedgerService) - Transactional financial writes
//! - [`EventRepository`](event::EventRepository) - Active event lookup
//! - [`SettingsRepository`](settings::SettingsRepository) - Business settings
//! - [`ProductRepository`](product::ProductRepository) - Product catalog

pub mod event;
pub mod ledger;
pub mod product;
pub mod settings;
