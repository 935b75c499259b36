//! # Settings Snapshot
//!
//! The settings table is a plain key/value store edited from outside the
//! core. Ledger and printer code never look keys up ad hoc: each operation
//! reads the keys it needs once and works on an immutable
//! [`SettingsSnapshot`].
//!
//! ## Known Keys
//! | Key               | Example        | Meaning                          |
//! |-------------------|----------------|----------------------------------|
//! | `deposit_cents`   | `50`           | payout per returned container    |
//! | `printer_backend` | `cups:EPSON`   | where receipts go (lazy checked) |
//! | `receipt_width`   | `32`           | characters per receipt line      |
//!
//! `printer_backend` is not validated here. It is only interpreted when a
//! receipt is dispatched, so a typo surfaces on the first print.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::{validate_deposit_cents, validate_receipt_width};

pub const DEPOSIT_CENTS_KEY: &str = "deposit_cents";
pub const PRINTER_BACKEND_KEY: &str = "printer_backend";
pub const RECEIPT_WIDTH_KEY: &str = "receipt_width";

pub const DEFAULT_DEPOSIT_CENTS: i64 = 50;
pub const DEFAULT_PRINTER_BACKEND: &str = "test";
pub const DEFAULT_RECEIPT_WIDTH: usize = 32;

/// Immutable view of the business settings for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub deposit_cents: i64,
    pub printer_backend: String,
    pub receipt_width: usize,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        SettingsSnapshot {
            deposit_cents: DEFAULT_DEPOSIT_CENTS,
            printer_backend: DEFAULT_PRINTER_BACKEND.to_string(),
            receipt_width: DEFAULT_RECEIPT_WIDTH,
        }
    }
}

impl SettingsSnapshot {
    /// Builds a snapshot from raw stored values.
    ///
    /// A missing key falls back to its seeded default. A present but
    /// malformed value is an error, never silently zero.
    ///
    /// ## Example
    /// ```rust
    /// use stand_core::settings::SettingsSnapshot;
    ///
    /// let snap = SettingsSnapshot::from_raw(Some("75"), Some("cups:EPSON"), None).unwrap();
    /// assert_eq!(snap.deposit_cents, 75);
    /// assert_eq!(snap.receipt_width, 32);
    /// assert!(SettingsSnapshot::from_raw(Some("fifty"), None, None).is_err());
    /// ```
    pub fn from_raw(
        deposit_cents: Option<&str>,
        printer_backend: Option<&str>,
        receipt_width: Option<&str>,
    ) -> CoreResult<Self> {
        let mut snapshot = SettingsSnapshot::default();

        if let Some(raw) = deposit_cents {
            let cents = parse_setting::<i64>(DEPOSIT_CENTS_KEY, raw)?;
            validate_deposit_cents(cents).map_err(|e| invalid(DEPOSIT_CENTS_KEY, raw, e))?;
            snapshot.deposit_cents = cents;
        }

        if let Some(raw) = printer_backend {
            snapshot.printer_backend = raw.trim().to_string();
        }

        if let Some(raw) = receipt_width {
            let width = parse_setting::<usize>(RECEIPT_WIDTH_KEY, raw)?;
            validate_receipt_width(width).map_err(|e| invalid(RECEIPT_WIDTH_KEY, raw, e))?;
            snapshot.receipt_width = width;
        }

        Ok(snapshot)
    }

    #[inline]
    pub fn deposit(&self) -> Money {
        Money::from_cents(self.deposit_cents)
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> CoreResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| invalid(key, raw, e))
}

fn invalid(key: &str, raw: &str, reason: impl std::fmt::Display) -> CoreError {
    CoreError::InvalidSetting {
        key: key.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_keys() {
        let snap = SettingsSnapshot::from_raw(None, None, None).unwrap();
        assert_eq!(snap, SettingsSnapshot::default());
        assert_eq!(snap.deposit().cents(), 50);
        assert_eq!(snap.printer_backend, "test");
    }

    #[test]
    fn test_malformed_values_are_errors() {
        assert!(matches!(
            SettingsSnapshot::from_raw(Some(""), None, None),
            Err(CoreError::InvalidSetting { .. })
        ));
        assert!(matches!(
            SettingsSnapshot::from_raw(Some("-5"), None, None),
            Err(CoreError::InvalidSetting { .. })
        ));
        assert!(matches!(
            SettingsSnapshot::from_raw(None, None, Some("4")),
            Err(CoreError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_backend_not_validated() {
        let snap = SettingsSnapshot::from_raw(None, Some(" bogus://x "), Some("48")).unwrap();
        assert_eq!(snap.printer_backend, "bogus://x");
        assert_eq!(snap.receipt_width, 48);
    }
}
