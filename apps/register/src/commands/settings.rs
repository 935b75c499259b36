//! # Settings Commands
//!
//! Read and edit the business settings in the `settings` table. Writes of
//! known keys are validated by the store; other keys are stored as given.

use stand_core::{Setting, SettingsSnapshot};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub async fn get(state: &AppState, key: &str) -> AppResult<Setting> {
    let value = state
        .db
        .settings()
        .get(key)
        .await?
        .ok_or_else(|| AppError::not_found("Setting", key))?;

    Ok(Setting {
        key: key.to_string(),
        value,
    })
}

/// Stores `value` and returns the snapshot the next operation will see.
pub async fn set(state: &AppState, key: &str, value: &str) -> AppResult<SettingsSnapshot> {
    let settings = state.db.settings();
    settings.set(key, value).await?;
    Ok(settings.snapshot().await?)
}

pub async fn show(state: &AppState) -> AppResult<Vec<Setting>> {
    Ok(state.db.settings().all().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_state;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_get_set_show() {
        let state = test_state().await;
        assert_eq!(get(&state, "deposit_cents").await.unwrap().value, "50");

        let snapshot = set(&state, "deposit_cents", " 25 ").await.unwrap();
        assert_eq!(snapshot.deposit_cents, 25);

        let snapshot = set(&state, "printer_backend", "cups:EPSON_TM").await.unwrap();
        assert_eq!(snapshot.printer_backend, "cups:EPSON_TM");

        let keys: Vec<String> = show(&state).await.unwrap().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["deposit_cents", "printer_backend", "receipt_width"]);
    }

    #[tokio::test]
    async fn test_invalid_and_missing() {
        let state = test_state().await;
        assert_eq!(
            set(&state, "receipt_width", "wide").await.unwrap_err().code,
            ErrorCode::Validation
        );
        assert_eq!(get(&state, "nope").await.unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(get(&state, "receipt_width").await.unwrap().value, "32");
    }
}
