//! # Settings Repository
//!
//! Key/value business settings. Every read is a single point read on the
//! `settings` table; there is no cache, so an edit made by another process
//! is seen by the next operation.

use sqlx::SqlitePool;
use stand_core::settings::{
    SettingsSnapshot, DEPOSIT_CENTS_KEY, PRINTER_BACKEND_KEY, RECEIPT_WIDTH_KEY,
};
use stand_core::Setting;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for the settings table.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Raw value for `key`, `None` when the key is absent.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Inserts or replaces a value.
    ///
    /// The numeric keys are trimmed and checked first so a typo cannot
    /// poison later reads. Every other value is stored as given.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let value = match key {
            DEPOSIT_CENTS_KEY => {
                let value = value.trim();
                SettingsSnapshot::from_raw(Some(value), None, None).map_err(DbError::InvalidValue)?;
                value
            }
            RECEIPT_WIDTH_KEY => {
                let value = value.trim();
                SettingsSnapshot::from_raw(None, None, Some(value)).map_err(DbError::InvalidValue)?;
                value
            }
            _ => value,
        };

        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, value = %value, "Setting updated");
        Ok(())
    }

    /// All settings ordered by key.
    pub async fn all(&self) -> DbResult<Vec<Setting>> {
        let settings = sqlx::query_as::<_, Setting>("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(settings)
    }

    /// Reads the known keys into an immutable snapshot.
    ///
    /// Missing keys take their defaults; malformed values are an error.
    pub async fn snapshot(&self) -> DbResult<SettingsSnapshot> {
        let deposit = self.get(DEPOSIT_CENTS_KEY).await?;
        let backend = self.get(PRINTER_BACKEND_KEY).await?;
        let width = self.get(RECEIPT_WIDTH_KEY).await?;

        SettingsSnapshot::from_raw(deposit.as_deref(), backend.as_deref(), width.as_deref())
            .map_err(DbError::InvalidValue)
    }

    /// Current deposit rate in cents.
    pub async fn deposit_cents(&self) -> DbResult<i64> {
        let raw = self.get(DEPOSIT_CENTS_KEY).await?;
        SettingsSnapshot::from_raw(raw.as_deref(), None, None)
            .map(|s| s.deposit_cents)
            .map_err(DbError::InvalidValue)
    }

    /// Current printer backend string, uninterpreted.
    pub async fn printer_backend(&self) -> DbResult<String> {
        let raw = self.get(PRINTER_BACKEND_KEY).await?;
        SettingsSnapshot::from_raw(None, raw.as_deref(), None)
            .map(|s| s.printer_backend)
            .map_err(DbError::InvalidValue)
    }
}
