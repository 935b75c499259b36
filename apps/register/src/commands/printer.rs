//! # Printer Commands

use std::fmt;

use serde::Serialize;
use stand_print::{receipt, Backend};
use tracing::info;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct TestPrintOutcome {
    pub backend: String,
    pub bytes: usize,
}

/// Prints the check page (store name, `Testdruck €`) on the configured
/// backend.
pub async fn test_print(state: &AppState) -> AppResult<TestPrintOutcome> {
    let settings = state.db.settings().snapshot().await?;
    let lines = receipt::test_page(&state.layout(&settings));
    let bytes = stand_print::escpos::encode(&lines, true);

    let backend = Backend::parse(&settings.printer_backend);
    state.printer.dispatch_to(&backend, &bytes).await?;
    info!(backend = %backend, bytes = bytes.len(), "Test page printed");

    Ok(TestPrintOutcome {
        backend: backend.to_string(),
        bytes: bytes.len(),
    })
}

impl fmt::Display for TestPrintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Testdruck sent to {} ({} bytes)", self.backend, self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{test_state, test_state_with};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_test_page_bytes() {
        let state = test_state().await;
        let outcome = test_print(&state).await.unwrap();
        assert_eq!(outcome.backend, "test");

        let job = state.printer.test_sink().last().unwrap();
        assert_eq!(job.len(), outcome.bytes);
        assert!(job.ends_with(b"Testdruck \x80\n\x1D\x56\x00"));
    }

    #[tokio::test]
    async fn test_spooled_backend() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("job.bin");

        let mut config = crate::config::AppConfig::default();
        config.printer.spool_program = "sh".into();
        config.printer.spool_args = vec![
            "-c".into(),
            format!("cat > '{}'", capture.display()),
            "lp".into(),
        ];
        let state = test_state_with(config).await;
        state.db.settings().set("printer_backend", "auto").await.unwrap();

        let outcome = test_print(&state).await.unwrap();
        assert_eq!(outcome.backend, "auto");
        assert_eq!(std::fs::read(&capture).unwrap().len(), outcome.bytes);
        assert!(state.printer.test_sink().jobs().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_backend() {
        let state = test_state().await;
        state
            .db
            .settings()
            .set("printer_backend", "winspool:POS-80")
            .await
            .unwrap();
        let err = test_print(&state).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Printer);
        assert!(state.printer.test_sink().jobs().is_empty());
    }
}
