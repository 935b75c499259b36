//! # Register Commands
//!
//! One module per operator action. Commands take the shared [`AppState`]
//! and return a serializable outcome; rendering is left to the caller.
//!
//! | Command          | Writes            | Prints                        |
//! |------------------|-------------------|-------------------------------|
//! | `sell`           | order + items     | receipt, failure reported     |
//! | `refund-deposit` | pfand_refund      | deposit slip, failure reported|
//! | `reverse`        | counter-order     | Storno slip, failure reported |
//! | `reprint`        | -                 | receipt, failure is the error |
//! | `test-print`     | -                 | test page                     |
//! | `settings`       | settings          | -                             |
//! | `products`       | -                 | -                             |
//! | `event`          | event             | -                             |
//! | `backup`         | copy of the file  | -                             |
//!
//! [`AppState`]: crate::state::AppState

pub mod backup;
pub mod deposit;
pub mod event;
pub mod printer;
pub mod products;
pub mod reversal;
pub mod sale;
pub mod settings;

#[cfg(test)]
pub(crate) async fn test_state() -> crate::state::AppState {
    test_state_with(crate::config::AppConfig::default()).await
}

/// In-memory database with the default catalog and the `test` backend.
#[cfg(test)]
pub(crate) async fn test_state_with(config: crate::config::AppConfig) -> crate::state::AppState {
    let db = stand_db::Database::new(stand_db::DbConfig::in_memory())
        .await
        .unwrap();
    db.products().seed_defaults_if_empty().await.unwrap();
    crate::state::AppState::new(db, config)
}
