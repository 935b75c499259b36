//! # Receipt Layout
//!
//! Builds the text lines of each slip the stand prints. The lines are plain
//! strings; [`escpos::encode`](crate::escpos::encode) turns them into bytes.
//!
//! ## Sale Receipt (width 32)
//! ```text
//! Grillstand am See
//! Order #12
//! 17.10.2026 14:03
//! --------------------------------
//! 2x Pommes                 7,00 €
//! 1x Cola 0.5L              2,50 €
//! --------------------------------
//! Summe:                    9,50 €
//!   MwSt 7 %:               0,46 €
//!   MwSt 19 %:              0,40 €
//! Gegeben:                 10,00 €
//! Wechselgeld:              0,50 €
//! Zahlart: Bar
//! ```
//!
//! Every line is cut to the receipt width. Widths count characters, which
//! matches printed columns because CP1252 is one byte per character.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use stand_core::{DepositRefund, Money, Order, OrderItem, PaymentMethod, TaxRate};

/// Store name and paper width shared by all slips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLayout {
    pub store_name: String,
    pub width: usize,
}

/// Cash handed over and change given back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tender {
    pub given: Money,
    pub change: Money,
}

impl ReceiptLayout {
    pub fn new(store_name: impl Into<String>, width: usize) -> Self {
        ReceiptLayout {
            store_name: store_name.into(),
            width,
        }
    }

    /// A full-width rule.
    pub fn separator(&self) -> String {
        "-".repeat(self.width)
    }

    /// Cuts `line` to the receipt width.
    pub fn fit(&self, line: &str) -> String {
        line.chars().take(self.width).collect()
    }

    /// `left` flush left, `right` flush right. The left side gives way when
    /// both do not fit.
    pub fn columns(&self, left: &str, right: &str) -> String {
        let right_len = right.chars().count();
        if right_len >= self.width {
            return self.fit(right);
        }

        let room = self.width - right_len - 1;
        let left: String = left.chars().take(room).collect();
        let pad = self.width - right_len - left.chars().count();
        format!("{left}{}{right}", " ".repeat(pad))
    }

    fn header(&self, title: String, at: DateTime<Utc>) -> Vec<String> {
        vec![
            self.fit(&self.store_name),
            self.fit(&title),
            self.fit(&format_timestamp(at)),
            self.separator(),
        ]
    }

    fn item_lines(&self, items: &[OrderItem]) -> Vec<String> {
        items
            .iter()
            .map(|item| {
                self.columns(
                    &format!("{}x {}", item.qty, item.name),
                    &Money::from_cents(item.line_cents).to_string(),
                )
            })
            .collect()
    }

    fn vat_lines(&self, items: &[OrderItem]) -> Vec<String> {
        vat_breakdown(items)
            .into_iter()
            .map(|(rate, tax)| self.columns(&format!("  MwSt {rate}:"), &tax.to_string()))
            .collect()
    }
}

/// Receipt label for a payment method.
pub fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Bar",
        PaymentMethod::Card => "Karte",
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string()
}

/// VAT contained in the items, per non-zero rate, ascending by rate.
///
/// Prices are gross, so the tax is extracted from each rate's line sum.
pub fn vat_breakdown(items: &[OrderItem]) -> Vec<(TaxRate, Money)> {
    let mut gross_by_rate: BTreeMap<u32, Money> = BTreeMap::new();
    for item in items.iter().filter(|i| i.tax_rate_bp > 0) {
        *gross_by_rate.entry(item.tax_rate_bp).or_default() += Money::from_cents(item.line_cents);
    }

    gross_by_rate
        .into_iter()
        .map(|(bps, gross)| {
            let rate = TaxRate::from_bps(bps);
            (rate, gross.included_tax(rate))
        })
        .collect()
}

// =============================================================================
// Slips
// =============================================================================

/// Customer receipt for a completed sale.
///
/// `tender` is printed for cash payments where the amount given is known.
pub fn sale_receipt(
    layout: &ReceiptLayout,
    order: &Order,
    items: &[OrderItem],
    tender: Option<Tender>,
) -> Vec<String> {
    let mut lines = layout.header(format!("Order #{}", order.id), order.created_at);
    lines.extend(layout.item_lines(items));
    lines.push(layout.separator());
    lines.push(layout.columns("Summe:", &Money::from_cents(order.total_cents).to_string()));
    lines.extend(layout.vat_lines(items));

    if let Some(tender) = tender {
        lines.push(layout.columns("Gegeben:", &tender.given.to_string()));
        lines.push(layout.columns("Wechselgeld:", &tender.change.to_string()));
    }

    lines.push(layout.fit(&format!("Zahlart: {}", payment_label(order.payment_method))));
    lines
}

/// Slip for a reversal order.
pub fn reversal_slip(
    layout: &ReceiptLayout,
    reversal: &Order,
    original_order_id: i64,
    items: &[OrderItem],
) -> Vec<String> {
    let mut lines = layout.header(format!("STORNO Order #{}", reversal.id), reversal.created_at);
    lines.insert(3, layout.fit(&format!("zu Order #{original_order_id}")));
    lines.extend(layout.item_lines(items));
    lines.push(layout.separator());
    lines.push(layout.columns("Summe:", &Money::from_cents(reversal.total_cents).to_string()));
    lines.extend(layout.vat_lines(items));
    lines.push(layout.fit(&format!("Zahlart: {}", payment_label(reversal.payment_method))));
    lines
}

/// Slip for a deposit payout.
pub fn deposit_slip(layout: &ReceiptLayout, refund: &DepositRefund) -> Vec<String> {
    let mut lines = layout.header("Pfand-Rückgabe".to_string(), refund.created_at);
    lines.push(layout.columns(
        &format!("{}x Pfand", refund.qty),
        &Money::from_cents(refund.amount_cents).to_string(),
    ));
    lines.push(layout.separator());
    lines.push(layout.columns("Auszahlung:", &Money::from_cents(refund.amount_cents).to_string()));
    lines
}

/// The printer check page.
pub fn test_page(layout: &ReceiptLayout) -> Vec<String> {
    vec![layout.fit(&layout.store_name), layout.fit("Testdruck €")]
}
