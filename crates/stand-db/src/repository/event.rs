//! # Event Repository
//!
//! Resolves the active event that every ledger write is attributed to.
//!
//! ## Transaction Scope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LedgerService::create_sale                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE ─────────────────────────────────────┐                │
//! │       │                                               │ same           │
//! │       ▼                                               │ connection     │
//! │  active_event_id_in(&mut tx)  ← read INSIDE the tx    │                │
//! │       │                                               │                │
//! │       ▼                                               │                │
//! │  INSERT orders / order_items                          │                │
//! │       │                                               │                │
//! │       ▼                                               │                │
//! │  COMMIT ──────────────────────────────────────────────┘                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reading the event through the pool while a transaction is open would need
//! a second connection. With a single-connection pool that never arrives, so
//! ledger code always uses the `_in` helpers.

use sqlx::{SqliteConnection, SqlitePool};
use stand_core::Event;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for event lookups.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    /// Creates a new EventRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EventRepository { pool }
    }

    /// Returns the id of the active event.
    ///
    /// ## Returns
    /// * `Ok(id)` - The single active event
    /// * `Err(DbError::NotFound)` - No event is active
    pub async fn active_event_id(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        active_event_id_in(&mut conn)
            .await?
            .ok_or_else(|| DbError::not_found("Active event", "-"))
    }

    /// Returns the active event row.
    pub async fn active_event(&self) -> DbResult<Event> {
        sqlx::query_as::<_, Event>(
            "SELECT id, name, active, created_at FROM event WHERE active = 1 LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Active event", "-"))
    }

    /// Gets an event by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, name, active, created_at FROM event WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Makes `name` the active event, creating it when needed.
    ///
    /// Deactivation and activation run in one transaction, so readers see
    /// exactly one active event before and after.
    pub async fn activate(&self, name: &str) -> DbResult<Event> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        sqlx::query("UPDATE event SET active = 0 WHERE active = 1")
            .execute(&mut *tx)
            .await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM event WHERE name = ?1 ORDER BY id LIMIT 1")
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?;

        let id = match existing {
            Some(id) => {
                sqlx::query("UPDATE event SET active = 1 WHERE id = ?1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            None => sqlx::query("INSERT INTO event (name, active, created_at) VALUES (?1, 1, ?2)")
                .bind(name)
                .bind(chrono::Utc::now())
                .execute(&mut *tx)
                .await?
                .last_insert_rowid(),
        };

        let event = sqlx::query_as::<_, Event>(
            "SELECT id, name, active, created_at FROM event WHERE id = ?1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(event_id = id, name = %name, "Event activated");
        Ok(event)
    }
}

/// Active event id read on an already-open connection or transaction.
pub async fn active_event_id_in(conn: &mut SqliteConnection) -> DbResult<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM event WHERE active = 1 LIMIT 1")
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================
