//! # Sale Commands
//!
//! Checkout: resolve the typed items against the catalog, check the cash
//! tender, commit the sale, then print the receipt.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  "2x Pommes" "Cola 0.5L"                                                │
//! │        │  parse_item_spec + ProductRepository::find_by_name             │
//! │        ▼                                                                │
//! │  Vec<CartLine>  (prices frozen here)                                    │
//! │        │  validate_cart + cash_change   ── error? nothing is written    │
//! │        ▼                                                                │
//! │  LedgerService::create_sale             ── COMMITTED                    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  sale_receipt ──► print_after_commit    ── failure → PrintStatus::Failed│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::Serialize;
use stand_core::sale::{cash_change, validate_cart};
use stand_core::{CartLine, Money, PaymentMethod, SaleResult, SettingsSnapshot};
use stand_print::{receipt, Tender};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::state::{AppState, PrintStatus};

/// Operator input for one checkout.
#[derive(Debug, Clone)]
pub struct SellRequest {
    /// Item specs such as `2x Pommes` or `Cola 0.5L`.
    pub items: Vec<String>,
    pub payment: PaymentMethod,
    /// Cash handed over, when the change should be computed.
    pub given: Option<Money>,
    pub print: bool,
}

/// Result of a committed sale.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub sale: SaleResult,
    pub payment: PaymentMethod,
    pub tender: Option<Tender>,
    pub print: PrintStatus,
}

/// Splits `"2x Pommes"` into `(2, "Pommes")`. Without a count prefix the
/// quantity is 1. `x`, `X` and `*` separate count and name.
pub fn parse_item_spec(spec: &str) -> AppResult<(i64, String)> {
    let spec = spec.trim();
    let (qty, name) = match spec.split_once(|c: char| matches!(c, 'x' | 'X' | '*')) {
        Some((count, rest)) => match count.trim().parse::<i64>() {
            Ok(qty) => (qty, rest.trim()),
            Err(_) => (1, spec),
        },
        None => (1, spec),
    };

    if name.is_empty() {
        return Err(AppError::validation(format!("Missing product name in '{spec}'")));
    }
    Ok((qty, name.to_string()))
}

/// Resolves item specs against the active catalog.
pub async fn resolve_cart(state: &AppState, items: &[String]) -> AppResult<Vec<CartLine>> {
    let products = state.db.products();
    let mut lines = Vec::with_capacity(items.len());

    for spec in items {
        let (qty, name) = parse_item_spec(spec)?;
        let product = products
            .find_by_name(&name)
            .await?
            .ok_or_else(|| AppError::not_found("Product", &name))?;
        lines.push(CartLine::from_product(&product, qty));
    }

    Ok(lines)
}

/// Runs one checkout.
///
/// Input errors and insufficient cash are reported before anything is
/// written. Once the sale is committed the result is `Ok`, whatever the
/// printer does.
pub async fn sell(state: &AppState, request: SellRequest) -> AppResult<CheckoutOutcome> {
    let settings = state.db.settings().snapshot().await?;
    let lines = resolve_cart(state, &request.items).await?;

    let tender = match (request.payment, request.given) {
        (PaymentMethod::Cash, Some(given)) => {
            let total = validate_cart(&lines)?;
            Some(Tender {
                given,
                change: cash_change(total, given)?,
            })
        }
        (PaymentMethod::Card, Some(_)) => {
            return Err(AppError::validation("--given applies to cash payments only"));
        }
        (_, None) => None,
    };

    let sale = state.db.ledger().create_sale(request.payment, &lines).await?;
    info!(
        order_id = sale.order_id,
        total = %sale.total,
        payment = %request.payment,
        "Checkout committed"
    );

    let print = if request.print {
        print_sale(state, &settings, sale.order_id, tender).await
    } else {
        PrintStatus::Skipped
    };

    Ok(CheckoutOutcome {
        sale,
        payment: request.payment,
        tender,
        print,
    })
}

async fn print_sale(
    state: &AppState,
    settings: &SettingsSnapshot,
    order_id: i64,
    tender: Option<Tender>,
) -> PrintStatus {
    match sale_lines(state, settings, order_id, tender).await {
        Ok(lines) => state.print_after_commit(settings, &lines).await,
        Err(e) => PrintStatus::Failed {
            backend: settings.printer_backend.clone(),
            error: e.message,
        },
    }
}

async fn sale_lines(
    state: &AppState,
    settings: &SettingsSnapshot,
    order_id: i64,
    tender: Option<Tender>,
) -> AppResult<Vec<String>> {
    let ledger = state.db.ledger();
    let order = ledger
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order", order_id))?;
    let items = ledger.get_items(order_id).await?;

    Ok(receipt::sale_receipt(&state.layout(settings), &order, &items, tender))
}

impl fmt::Display for CheckoutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order #{}: {} ({})",
            self.sale.order_id,
            self.sale.total,
            receipt::payment_label(self.payment)
        )?;
        if let Some(tender) = &self.tender {
            write!(f, "\nGegeben: {}  Wechselgeld: {}", tender.given, tender.change)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_state;
    use crate::error::ErrorCode;

    fn request(items: &[&str], payment: PaymentMethod, given: Option<i64>) -> SellRequest {
        SellRequest {
            items: items.iter().map(|s| s.to_string()).collect(),
            payment,
            given: given.map(Money::from_cents),
            print: true,
        }
    }

    async fn order_count(state: &AppState) -> usize {
        state.db.ledger().recent_orders(100).await.unwrap().len()
    }

    #[test]
    fn test_parse_item_spec() {
        assert_eq!(parse_item_spec("2x Pommes").unwrap(), (2, "Pommes".to_string()));
        assert_eq!(parse_item_spec(" 3 * Cola 0.5L ").unwrap(), (3, "Cola 0.5L".to_string()));
        assert_eq!(parse_item_spec("Pommes").unwrap(), (1, "Pommes".to_string()));
        assert_eq!(parse_item_spec("Mexx Burger").unwrap(), (1, "Mexx Burger".to_string()));
        assert_eq!(parse_item_spec("0x Pommes").unwrap(), (0, "Pommes".to_string()));
        assert!(parse_item_spec("2x ").is_err());
    }

    #[tokio::test]
    async fn test_cash_sale_prints_receipt_with_change() {
        let state = test_state().await;
        let outcome = sell(&state, request(&["2x Pommes", "Cola 0.5L"], PaymentMethod::Cash, Some(1000)))
            .await
            .unwrap();

        assert_eq!(outcome.sale.total.cents(), 950);
        assert_eq!(outcome.tender.unwrap().change.cents(), 50);
        assert_eq!(
            outcome.print,
            PrintStatus::Printed {
                backend: "test".into()
            }
        );

        let job = state.printer.test_sink().last().unwrap();
        assert_eq!(&job[..5], &[0x1B, 0x40, 0x1B, 0x74, 0x10]);
        let text = String::from_utf8_lossy(&job);
        assert!(text.contains(&format!("Order #{}", outcome.sale.order_id)));
        assert!(text.contains("Wechselgeld:"));
    }

    #[tokio::test]
    async fn test_insufficient_cash_writes_nothing() {
        let state = test_state().await;
        let err = sell(&state, request(&["2x Pommes"], PaymentMethod::Cash, Some(500)))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(order_count(&state).await, 0);
        assert!(state.printer.test_sink().jobs().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_and_bad_quantity() {
        let state = test_state().await;

        let err = sell(&state, request(&["Bratwurst"], PaymentMethod::Card, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = sell(&state, request(&["0x Pommes"], PaymentMethod::Card, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(order_count(&state).await, 0);
    }

    #[tokio::test]
    async fn test_card_with_given_rejected() {
        let state = test_state().await;
        let err = sell(&state, request(&["Pommes"], PaymentMethod::Card, Some(1000)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn test_print_failure_keeps_sale() {
        let state = test_state().await;
        state.db.settings().set("printer_backend", "lpt1").await.unwrap();

        let outcome = sell(&state, request(&["Pommes"], PaymentMethod::Card, None))
            .await
            .unwrap();

        assert!(outcome.print.is_failed());
        let order = state.db.ledger().get_order(outcome.sale.order_id).await.unwrap();
        assert!(order.is_some());
        assert_eq!(order_count(&state).await, 1);
    }

    #[tokio::test]
    async fn test_no_print_skips_dispatch() {
        let state = test_state().await;
        let mut req = request(&["Pommes"], PaymentMethod::Card, None);
        req.print = false;

        let outcome = sell(&state, req).await.unwrap();
        assert_eq!(outcome.print, PrintStatus::Skipped);
        assert!(state.printer.test_sink().jobs().is_empty());
    }
}
