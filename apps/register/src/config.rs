//! # Register Configuration
//!
//! Deployment settings for the register binary. Business settings (deposit
//! rate, printer backend, receipt width) are not here; they live in the
//! `settings` table and are read per operation.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (--db)                       (highest priority)       │
//! │                                                                         │
//! │  2. Environment Variables                                               │
//! │     STAND_DB_PATH=/srv/stand/stand.db                                  │
//! │     STAND_LOCK_TIMEOUT_MS=2000                                         │
//! │     STAND_SPOOL_TIMEOUT_SECS=10                                        │
//! │     STAND_STORE_NAME="Grillstand am See"                               │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/stand-pos/register.toml (Linux)                          │
//! │                                                                         │
//! │  4. Default Values                           (lowest priority)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # register.toml
//! [store]
//! name = "Grillstand am See"
//!
//! [database]
//! path = "/srv/stand/stand.db"
//! max_connections = 5
//! lock_timeout_ms = 5000
//!
//! [printer]
//! spool_program = "lp"
//! spool_args = []
//! spool_timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stand_db::DbConfig;
use stand_print::PrinterConfig;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// Name printed at the top of every slip unless configured.
pub const DEFAULT_STORE_NAME: &str = "Mühle Live POS";

const CONFIG_FILE_NAME: &str = "register.toml";
const DB_FILE_NAME: &str = "stand.db";
const BACKUP_DIR_NAME: &str = "backups";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Receipt header.
    pub name: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: DEFAULT_STORE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    pub path: Option<PathBuf>,

    pub max_connections: u32,

    /// How long a write waits for the database lock.
    pub lock_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: 5,
            lock_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterSettings {
    /// Spooler used for `cups:` and `auto` backends.
    pub spool_program: String,

    /// Arguments placed before the backend's own `lp` arguments.
    pub spool_args: Vec<String>,

    pub spool_timeout_secs: u64,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        PrinterSettings {
            spool_program: "lp".to_string(),
            spool_args: Vec::new(),
            spool_timeout_secs: 30,
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreSettings,
    pub database: DatabaseSettings,
    pub printer: PrinterSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`register.toml`); an explicit path must exist
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses one TOML file. Missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        info!(?path, "Loading register config from file");
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Cannot read {}: {e}", path.display())))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AppResult<()> {
        if self.store.name.trim().is_empty() {
            return Err(AppError::config("store.name must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::config("database.max_connections must be greater than 0"));
        }
        if self.database.lock_timeout_ms == 0 {
            return Err(AppError::config("database.lock_timeout_ms must be greater than 0"));
        }
        if self.printer.spool_program.trim().is_empty() {
            return Err(AppError::config("printer.spool_program must not be empty"));
        }
        if self.printer.spool_timeout_secs == 0 {
            return Err(AppError::config("printer.spool_timeout_secs must be greater than 0"));
        }

        Ok(())
    }

    /// Applies `STAND_*` overrides read through `lookup`.
    ///
    /// Unparsable numbers are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("STAND_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup("STAND_LOCK_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.database.lock_timeout_ms = ms,
                Err(_) => warn!(value = %raw, "Ignoring invalid STAND_LOCK_TIMEOUT_MS"),
            }
        }

        if let Some(raw) = lookup("STAND_SPOOL_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.printer.spool_timeout_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring invalid STAND_SPOOL_TIMEOUT_SECS"),
            }
        }

        if let Some(name) = lookup("STAND_STORE_NAME") {
            self.store.name = name;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "stand", "stand-pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Resolves the database file, creating the data directory when the
    /// platform default is used.
    pub fn database_path(&self) -> AppResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("org", "stand", "stand-pos")
            .ok_or_else(|| AppError::config("Cannot determine a data directory; set STAND_DB_PATH"))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join(DB_FILE_NAME))
    }

    /// Directory for `stand backup` without a target: `backups/` next to the
    /// database file. Created when missing.
    pub fn backup_dir(&self) -> AppResult<PathBuf> {
        let db_path = self.database_path()?;
        let dir = db_path
            .parent()
            .map(|parent| parent.join(BACKUP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(BACKUP_DIR_NAME));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.database.lock_timeout_ms)
    }

    pub fn spool_timeout(&self) -> Duration {
        Duration::from_secs(self.printer.spool_timeout_secs)
    }

    /// Pool configuration for `path`.
    pub fn db_config(&self, path: impl Into<PathBuf>) -> DbConfig {
        DbConfig::new(path)
            .max_connections(self.database.max_connections)
            .lock_timeout(self.lock_timeout())
    }

    pub fn printer_config(&self) -> PrinterConfig {
        PrinterConfig::default()
            .spool_program(
                self.printer.spool_program.clone(),
                self.printer.spool_args.iter().cloned(),
            )
            .spool_timeout(self.spool_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.name, DEFAULT_STORE_NAME);
        assert_eq!(config.lock_timeout(), Duration::from_secs(5));
        assert_eq!(config.spool_timeout(), Duration::from_secs(30));
        assert_eq!(config.printer_config().spool_program, "lp");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("register.toml");
        std::fs::write(
            &path,
            "[store]\nname = \"Grillstand\"\n\n[printer]\nspool_timeout_secs = 5\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.store.name, "Grillstand");
        assert_eq!(config.printer.spool_timeout_secs, 5);
        assert_eq!(config.printer.spool_program, "lp");
        assert_eq!(config.database.lock_timeout_ms, 5_000);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = AppConfig::load(Some(PathBuf::from("/nonexistent/register.toml"))).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Config);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("register.toml");
        std::fs::write(&path, "[database]\nlock_timeout_ms = \"soon\"\n").unwrap();

        let err = AppConfig::from_file(&path).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Config);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STAND_DB_PATH", "/tmp/x.db"),
            ("STAND_LOCK_TIMEOUT_MS", "250"),
            ("STAND_SPOOL_TIMEOUT_SECS", "later"),
            ("STAND_STORE_NAME", "Kiosk"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
        assert_eq!(config.printer.spool_timeout_secs, 30);
        assert_eq!(config.store.name, "Kiosk");
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/x.db"));
        assert_eq!(config.db_config("/tmp/x.db").lock_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.database.lock_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.store.name = "  ".into();
        assert!(config.validate().is_err());
    }
}
