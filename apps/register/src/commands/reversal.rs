//! # Reversal & Reprint Commands
//!
//! `reverse` writes the counter-order ("Storno") and prints its slip.
//! `reprint` prints any stored order again: a sale gets its receipt, a
//! reversal order gets its Storno slip.

use std::fmt;

use serde::Serialize;
use stand_core::{ReversalResult, SettingsSnapshot};
use stand_print::receipt;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::state::{AppState, PrintStatus};

#[derive(Debug, Clone, Serialize)]
pub struct ReversalOutcome {
    pub reversal: ReversalResult,
    pub print: PrintStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReprintOutcome {
    pub order_id: i64,
    pub backend: String,
}

pub async fn reverse(state: &AppState, order_id: i64, print: bool) -> AppResult<ReversalOutcome> {
    let settings = state.db.settings().snapshot().await?;
    let reversal = state.db.ledger().reverse_order(order_id).await?;

    let print = if print {
        match reversal_lines(state, &settings, reversal.reversal_order_id, order_id).await {
            Ok(lines) => state.print_after_commit(&settings, &lines).await,
            Err(e) => PrintStatus::Failed {
                backend: settings.printer_backend.clone(),
                error: e.message,
            },
        }
    } else {
        PrintStatus::Skipped
    };

    Ok(ReversalOutcome { reversal, print })
}

/// Prints a stored order again. Nothing is written, so a print failure is
/// the command's error.
///
/// Cash tender is not stored, so reprinted sale receipts omit it.
pub async fn reprint(state: &AppState, order_id: i64) -> AppResult<ReprintOutcome> {
    let settings = state.db.settings().snapshot().await?;
    let ledger = state.db.ledger();

    let lines = match ledger.get_reversal_origin(order_id).await? {
        Some(link) => reversal_lines(state, &settings, order_id, link.original_order_id).await?,
        None => {
            let order = ledger
                .get_order(order_id)
                .await?
                .ok_or_else(|| AppError::not_found("Order", order_id))?;
            let items = ledger.get_items(order_id).await?;
            receipt::sale_receipt(&state.layout(&settings), &order, &items, None)
        }
    };

    state.print_lines(&settings, &lines).await?;
    info!(order_id, backend = %settings.printer_backend, "Order reprinted");

    Ok(ReprintOutcome {
        order_id,
        backend: settings.printer_backend,
    })
}

async fn reversal_lines(
    state: &AppState,
    settings: &SettingsSnapshot,
    reversal_order_id: i64,
    original_order_id: i64,
) -> AppResult<Vec<String>> {
    let ledger = state.db.ledger();
    let order = ledger
        .get_order(reversal_order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order", reversal_order_id))?;
    let items = ledger.get_items(reversal_order_id).await?;

    Ok(receipt::reversal_slip(
        &state.layout(settings),
        &order,
        original_order_id,
        &items,
    ))
}

impl fmt::Display for ReversalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "STORNO Order #{} zu Order #{}: {}",
            self.reversal.reversal_order_id, self.reversal.original_order_id, self.reversal.total
        )
    }
}

impl fmt::Display for ReprintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order #{} sent to {}", self.order_id, self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sale::{sell, SellRequest};
    use crate::commands::test_state;
    use crate::error::ErrorCode;
    use stand_core::PaymentMethod;

    async fn sold(state: &AppState) -> i64 {
        let outcome = sell(
            state,
            SellRequest {
                items: vec!["2x Pommes".into()],
                payment: PaymentMethod::Cash,
                given: None,
                print: false,
            },
        )
        .await
        .unwrap();
        outcome.sale.order_id
    }

    fn job_text(state: &AppState) -> String {
        String::from_utf8_lossy(&state.printer.test_sink().last().unwrap()).into_owned()
    }

    #[tokio::test]
    async fn test_reverse_prints_storno_slip() {
        let state = test_state().await;
        let order_id = sold(&state).await;

        let outcome = reverse(&state, order_id, true).await.unwrap();
        assert_eq!(outcome.reversal.total.cents(), -700);
        assert!(matches!(outcome.print, PrintStatus::Printed { .. }));

        let text = job_text(&state);
        assert!(text.contains(&format!("STORNO Order #{}", outcome.reversal.reversal_order_id)));
        assert!(text.contains(&format!("zu Order #{order_id}")));
    }

    #[tokio::test]
    async fn test_reverse_twice_is_business_rule() {
        let state = test_state().await;
        let order_id = sold(&state).await;
        let first = reverse(&state, order_id, false).await.unwrap();

        let err = reverse(&state, order_id, false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let err = reverse(&state, first.reversal.reversal_order_id, false)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let err = reverse(&state, 999, false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_reprint_sale_and_reversal() {
        let state = test_state().await;
        let order_id = sold(&state).await;
        let storno = reverse(&state, order_id, false).await.unwrap();

        reprint(&state, order_id).await.unwrap();
        let text = job_text(&state);
        assert!(text.contains(&format!("Order #{order_id}")));
        assert!(!text.contains("STORNO"));

        reprint(&state, storno.reversal.reversal_order_id).await.unwrap();
        assert!(job_text(&state).contains("STORNO"));
        assert_eq!(state.printer.test_sink().jobs().len(), 2);
    }

    #[tokio::test]
    async fn test_reprint_errors() {
        let state = test_state().await;
        assert_eq!(reprint(&state, 5).await.unwrap_err().code, ErrorCode::NotFound);

        let order_id = sold(&state).await;
        state.db.settings().set("printer_backend", "usb").await.unwrap();
        assert_eq!(
            reprint(&state, order_id).await.unwrap_err().code,
            ErrorCode::Printer
        );
    }
}
