//! # Backup Command
//!
//! Copies the live ledger to a standalone SQLite file while registers keep
//! selling. Restoring is a file copy with every register stopped.

use std::fmt;
use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct BackupOutcome {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Writes a backup to `target`, or to a timestamped file in
/// [`AppConfig::backup_dir`](crate::config::AppConfig::backup_dir).
pub async fn backup(state: &AppState, target: Option<PathBuf>) -> AppResult<BackupOutcome> {
    let path = match target {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.is_dir() {
                    return Err(AppError::validation(format!(
                        "Backup directory does not exist: {}",
                        parent.display()
                    )));
                }
            }
            path
        }
        None => state.config.backup_dir()?.join(default_file_name()),
    };

    let bytes = state.db.backup(&path).await?;
    Ok(BackupOutcome { path, bytes })
}

fn default_file_name() -> String {
    format!("stand-{}.db", Local::now().format("%Y%m%d-%H%M%S"))
}

impl fmt::Display for BackupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Backup written to {} ({} bytes)", self.path.display(), self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sale::{sell, SellRequest};
    use crate::commands::{test_state, test_state_with};
    use crate::config::AppConfig;
    use crate::error::ErrorCode;
    use stand_core::PaymentMethod;
    use stand_db::{Database, DbConfig};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_backup_holds_committed_sale() {
        let dir = TempDir::new().unwrap();
        let state = test_state().await;
        let sale = sell(
            &state,
            SellRequest {
                items: vec!["2x Pommes".into()],
                payment: PaymentMethod::Cash,
                given: None,
                print: false,
            },
        )
        .await
        .unwrap()
        .sale;

        let target = dir.path().join("copy.db");
        let outcome = backup(&state, Some(target.clone())).await.unwrap();
        assert_eq!(outcome.path, target);
        assert!(outcome.bytes > 0);

        let copy = Database::new(DbConfig::new(&target)).await.unwrap();
        let order = copy.ledger().get_order(sale.order_id).await.unwrap().unwrap();
        assert_eq!(order.total_cents, 700);

        let err = backup(&state, Some(target)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn test_default_target_next_to_database() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.database.path = Some(dir.path().join("stand.db"));
        let state = test_state_with(config).await;

        let outcome = backup(&state, None).await.unwrap();
        assert_eq!(outcome.path.parent(), Some(dir.path().join("backups").as_path()));
        let name = outcome.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("stand-") && name.ends_with(".db"));
        assert!(outcome.path.is_file());
    }

    #[tokio::test]
    async fn test_missing_directory_rejected() {
        let dir = TempDir::new().unwrap();
        let state = test_state().await;
        let err = backup(&state, Some(dir.path().join("nope").join("copy.db")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }
}
