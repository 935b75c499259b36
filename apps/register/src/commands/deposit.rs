//! # Deposit Refund Command
//!
//! Pays out returned containers. Without `--amount` the payout is computed
//! from the configured rate; with it, the amount is checked against
//! `qty × deposit_cents` before anything is written.

use std::fmt;

use serde::Serialize;
use stand_core::{DepositRefund, Money};
use stand_print::receipt;

use crate::error::{AppError, AppResult};
use crate::state::{AppState, PrintStatus};

#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub refund: DepositRefund,
    pub print: PrintStatus,
}

pub async fn refund_deposit(
    state: &AppState,
    qty: i64,
    amount: Option<Money>,
    print: bool,
) -> AppResult<RefundOutcome> {
    let settings = state.db.settings().snapshot().await?;
    let ledger = state.db.ledger();

    let refund = match amount {
        None => ledger.refund_deposit_at_rate(qty, settings.deposit_cents).await?,
        Some(amount) => {
            let id = ledger
                .checked_refund(qty, amount.cents(), settings.deposit_cents)
                .await?;
            ledger
                .get_refund(id)
                .await?
                .ok_or_else(|| AppError::not_found("Deposit refund", id))?
        }
    };

    let print = if print {
        let lines = receipt::deposit_slip(&state.layout(&settings), &refund);
        state.print_after_commit(&settings, &lines).await
    } else {
        PrintStatus::Skipped
    };

    Ok(RefundOutcome { refund, print })
}

impl fmt::Display for RefundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pfand-Rückgabe #{}: {}x, Auszahlung {}",
            self.refund.id,
            self.refund.qty,
            self.refund.amount()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_state;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_refund_at_configured_rate() {
        let state = test_state().await;
        state.db.settings().set("deposit_cents", "100").await.unwrap();

        let outcome = refund_deposit(&state, 3, None, true).await.unwrap();
        assert_eq!(outcome.refund.amount_cents, 300);
        assert!(matches!(outcome.print, PrintStatus::Printed { .. }));

        let job = state.printer.test_sink().last().unwrap();
        // "3,00 €" with € as CP1252 0x80
        assert!(job.windows(6).any(|w| w == b"3,00 \x80"));
    }

    #[tokio::test]
    async fn test_checked_amount() {
        let state = test_state().await;

        let outcome = refund_deposit(&state, 2, Some(Money::from_cents(100)), false)
            .await
            .unwrap();
        assert_eq!(outcome.refund.amount_cents, 100);
        assert_eq!(outcome.print, PrintStatus::Skipped);

        let err = refund_deposit(&state, 2, Some(Money::from_cents(150)), false)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn test_non_positive_quantity() {
        let state = test_state().await;
        let err = refund_deposit(&state, 0, None, false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }
}
