//! # Sale Math
//!
//! Pure calculations behind the ledger: cart line validation, order totals,
//! reversal mirroring, deposit amounts and cash change.
//!
//! ## Where This Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller builds Vec<CartLine>                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_cart(&lines) ← THIS MODULE (no I/O)                          │
//! │       │   ├── empty?          → CoreError::EmptyCart                    │
//! │       │   ├── qty <= 0?       → CoreError::InvalidQuantity              │
//! │       │   ├── bad price/tax?  → CoreError::InvalidLine                  │
//! │       │   └── overflow?       → CoreError::InvalidLine                  │
//! │       ▼                                                                 │
//! │  total (Money)                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerService::create_sale writes order + items in ONE transaction    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{OrderItem, Product, TaxRate};
use crate::validation::{
    validate_line_name, validate_price_cents, validate_quantity, validate_tax_rate_bps,
};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a cart as handed to `create_sale`.
///
/// Name, price and tax are the values that get frozen into the order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub unit_cents: i64,
    pub qty: i64,
    pub tax_rate_bp: u32,
    pub product_id: Option<i64>,
}

impl CartLine {
    /// A free-form line that is not linked to a catalog product.
    pub fn new(name: impl Into<String>, unit_cents: i64, qty: i64, tax_rate: TaxRate) -> Self {
        CartLine {
            name: name.into(),
            unit_cents,
            qty,
            tax_rate_bp: tax_rate.bps(),
            product_id: None,
        }
    }

    /// Snapshots a catalog product.
    ///
    /// ## Price Freezing
    /// The price is captured here. Later catalog edits do not touch the line
    /// or the order item written from it.
    pub fn from_product(product: &Product, qty: i64) -> Self {
        CartLine {
            name: product.name.clone(),
            unit_cents: product.price_cents,
            qty,
            tax_rate_bp: product.tax_rate_bp,
            product_id: Some(product.id),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bp)
    }

    /// unit × qty, `None` on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price().checked_mul_qty(self.qty)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Validates a cart for sale and returns its total.
///
/// ## Example
/// ```rust
/// use stand_core::sale::{validate_cart, CartLine};
/// use stand_core::types::TaxRate;
///
/// let lines = vec![
///     CartLine::new("Pommes", 350, 2, TaxRate::from_bps(700)),
///     CartLine::new("Cola 0.5L", 250, 1, TaxRate::from_bps(1900)),
/// ];
/// assert_eq!(validate_cart(&lines).unwrap().cents(), 950);
/// ```
pub fn validate_cart(lines: &[CartLine]) -> CoreResult<Money> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    for (index, line) in lines.iter().enumerate() {
        validate_quantity(line.qty).map_err(|_| CoreError::InvalidQuantity { qty: line.qty })?;
        let invalid = |e: crate::error::ValidationError| CoreError::InvalidLine {
            index,
            reason: e.to_string(),
        };
        validate_line_name(&line.name).map_err(invalid)?;
        validate_price_cents(line.unit_cents).map_err(invalid)?;
        validate_tax_rate_bps(line.tax_rate_bp).map_err(invalid)?;
    }

    lines_total(lines)
}

/// Σ(unit × qty) with overflow checking, no sign rules.
///
/// Used directly for reversal lines, which carry negative unit prices.
pub fn lines_total(lines: &[CartLine]) -> CoreResult<Money> {
    lines
        .iter()
        .enumerate()
        .try_fold(Money::zero(), |acc, (index, line)| {
            line.line_total()
                .and_then(|line_total| acc.checked_add(line_total))
                .ok_or_else(|| CoreError::InvalidLine {
                    index,
                    reason: "amount overflow".to_string(),
                })
        })
}

// =============================================================================
// Reversal
// =============================================================================

/// Builds the counter-lines of a reversal ("Storno").
///
/// Each original item is mirrored with the same name, quantity, tax rate and
/// product link and a negated unit price, so every line total and the order
/// total are the exact negation of the original.
pub fn reversal_lines(items: &[OrderItem]) -> Vec<CartLine> {
    items
        .iter()
        .map(|item| CartLine {
            name: item.name.clone(),
            unit_cents: -item.unit_cents,
            qty: item.qty,
            tax_rate_bp: item.tax_rate_bp,
            product_id: item.product_id,
        })
        .collect()
}

// =============================================================================
// Deposit
// =============================================================================

/// Payout for `qty` returned containers at `deposit_cents` each.
///
/// ## Example
/// ```rust
/// use stand_core::sale::deposit_amount;
///
/// assert_eq!(deposit_amount(3, 50).unwrap().cents(), 150);
/// assert!(deposit_amount(0, 50).is_err());
/// ```
pub fn deposit_amount(qty: i64, deposit_cents: i64) -> CoreResult<Money> {
    if qty <= 0 {
        return Err(CoreError::InvalidQuantity { qty });
    }
    crate::validation::validate_deposit_cents(deposit_cents)?;

    Money::from_cents(deposit_cents)
        .checked_mul_qty(qty)
        .ok_or_else(|| CoreError::InvalidLine {
            index: 0,
            reason: "deposit amount overflow".to_string(),
        })
}

/// Checks a caller-supplied refund amount against the configured rate.
pub fn check_deposit_amount(qty: i64, amount_cents: i64, deposit_cents: i64) -> CoreResult<()> {
    let expected = deposit_amount(qty, deposit_cents)?;
    if expected.cents() != amount_cents {
        return Err(CoreError::DepositMismatch {
            qty,
            amount_cents,
            expected_cents: expected.cents(),
        });
    }
    Ok(())
}

// =============================================================================
// Cash
// =============================================================================

/// Change to hand back for a cash payment.
pub fn cash_change(total: Money, tendered: Money) -> CoreResult<Money> {
    if tendered < total {
        return Err(CoreError::InsufficientTender {
            total_cents: total.cents(),
            tendered_cents: tendered.cents(),
        });
    }
    Ok(tendered - total)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pommes(qty: i64) -> CartLine {
        CartLine::new("Pommes", 350, qty, TaxRate::from_bps(700))
    }

    #[test]
    fn test_validate_cart_total() {
        let lines = vec![pommes(2), CartLine::new("Pfand", 50, 3, TaxRate::zero())];
        assert_eq!(validate_cart(&lines).unwrap().cents(), 850);
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert_eq!(validate_cart(&[]), Err(CoreError::EmptyCart));
    }

    #[test]
    fn test_line_rules() {
        assert_eq!(
            validate_cart(&[pommes(0)]),
            Err(CoreError::InvalidQuantity { qty: 0 })
        );

        let negative = CartLine::new("Pommes", -1, 1, TaxRate::zero());
        assert!(matches!(
            validate_cart(&[pommes(1), negative]),
            Err(CoreError::InvalidLine { index: 1, .. })
        ));

        let bad_tax = CartLine::new("Cola", 250, 1, TaxRate::from_bps(10_001));
        assert!(matches!(
            validate_cart(&[bad_tax]),
            Err(CoreError::InvalidLine { index: 0, .. })
        ));

        let unnamed = CartLine::new(" ", 250, 1, TaxRate::zero());
        assert!(matches!(
            validate_cart(&[unnamed]),
            Err(CoreError::InvalidLine { index: 0, .. })
        ));
    }

    #[test]
    fn test_overflow_rejected() {
        let huge = CartLine::new("Gold", i64::MAX / 2, 3, TaxRate::zero());
        assert!(matches!(
            validate_cart(&[huge]),
            Err(CoreError::InvalidLine { .. })
        ));

        let half = CartLine::new("Gold", i64::MAX / 2 + 1, 1, TaxRate::zero());
        assert!(matches!(
            validate_cart(&[half.clone(), half]),
            Err(CoreError::InvalidLine { index: 1, .. })
        ));
    }

    #[test]
    fn test_from_product_snapshot() {
        let product = Product {
            id: 7,
            name: "Cola 0.5L".to_string(),
            price_cents: 250,
            tax_rate_bp: 1900,
            category: Some("GETRÄNK".to_string()),
            active: true,
            color_hex: None,
            symbol: None,
            is_deposit: false,
            event_id: None,
        };
        let line = CartLine::from_product(&product, 2);
        assert_eq!(line.product_id, Some(7));
        assert_eq!(line.line_total(), Some(Money::from_cents(500)));
        assert_eq!(line.tax_rate(), TaxRate::from_bps(1900));
    }

    #[test]
    fn test_reversal_lines_negate_total() {
        let items = vec![
            OrderItem {
                id: 1,
                order_id: 9,
                product_id: Some(3),
                name: "Pommes".to_string(),
                unit_cents: 350,
                qty: 2,
                tax_rate_bp: 700,
                line_cents: 700,
            },
            OrderItem {
                id: 2,
                order_id: 9,
                product_id: None,
                name: "Pfand".to_string(),
                unit_cents: 50,
                qty: 1,
                tax_rate_bp: 0,
                line_cents: 50,
            },
        ];
        let mirrored = reversal_lines(&items);
        assert_eq!(mirrored.len(), 2);
        assert_eq!(mirrored[0].unit_cents, -350);
        assert_eq!(mirrored[0].qty, 2);
        assert_eq!(mirrored[0].product_id, Some(3));
        assert_eq!(lines_total(&mirrored).unwrap().cents(), -750);
    }

    #[test]
    fn test_deposit_amount() {
        assert_eq!(deposit_amount(3, 50).unwrap().cents(), 150);
        assert_eq!(deposit_amount(-1, 50), Err(CoreError::InvalidQuantity { qty: -1 }));
        assert!(deposit_amount(1, -50).is_err());
        assert!(check_deposit_amount(3, 150, 50).is_ok());
        assert_eq!(
            check_deposit_amount(3, 100, 50),
            Err(CoreError::DepositMismatch {
                qty: 3,
                amount_cents: 100,
                expected_cents: 150
            })
        );
    }

    #[test]
    fn test_cash_change() {
        let total = Money::from_cents(950);
        assert_eq!(cash_change(total, Money::from_cents(1000)).unwrap().cents(), 50);
        assert_eq!(cash_change(total, total).unwrap().cents(), 0);
        assert!(matches!(
            cash_change(total, Money::from_cents(900)),
            Err(CoreError::InsufficientTender { .. })
        ));
    }
}
