//! # Ledger Service
//!
//! The only code path that writes financial records: sales, deposit
//! refunds and reversals. Each operation is one `BEGIN IMMEDIATE`
//! transaction that either commits completely or leaves no trace.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         create_sale                                     │
//! │                                                                         │
//! │  validate_cart(lines)          (stand-core, before any I/O)            │
//! │       │   └── EmptyCart / InvalidQuantity / InvalidLine → return       │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE               waits ≤ lock_timeout, else Busy         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  active event (same tx)        none → NoActiveEvent                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT orders                 total, payment, event, created_at       │
//! │  INSERT order_items × n        name/price/tax frozen from the line     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT                        any error above → tx dropped → ROLLBACK │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reversal ("Storno")
//! A reversal is a new order whose items mirror the original with negated
//! unit prices, plus a link row in `order_reversals`. The original is never
//! modified. The link's UNIQUE constraint on `original_order_id` is the last
//! line of defence against reversing an order twice.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use stand_core::sale::{check_deposit_amount, deposit_amount, lines_total, reversal_lines, validate_cart};
use stand_core::{
    CartLine, DepositRefund, Money, Order, OrderItem, OrderReversal, PaymentMethod,
    ReversalResult, SaleResult,
};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult, LedgerError, LedgerResult};
use crate::repository::event::active_event_id_in;

const ORDER_COLUMNS: &str = "id, total_cents, payment_method, event_id, created_at";
const ITEM_COLUMNS: &str =
    "id, order_id, product_id, name, unit_cents, qty, tax_rate_bp, line_cents";
const REVERSAL_COLUMNS: &str = "id, original_order_id, reversal_order_id, created_at";
const REFUND_COLUMNS: &str = "id, qty, amount_cents, event_id, created_at";

/// Transactional writer for orders, deposit refunds and reversals.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.ledger();
///
/// let sale = ledger.create_sale(PaymentMethod::Cash, &lines).await?;
/// let refund_id = ledger.refund_deposit(3, 150).await?;
/// let storno = ledger.reverse_order(sale.order_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct LedgerService {
    pool: SqlitePool,
}

impl LedgerService {
    /// Creates a new LedgerService.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerService { pool }
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Records a sale: one order plus one item per cart line.
    ///
    /// ## Arguments
    /// * `payment` - Cash or card
    /// * `lines` - Cart lines; their name, unit price and tax rate are frozen
    ///   into the order items
    ///
    /// ## Returns
    /// The new order id and the total (Σ unit × qty).
    ///
    /// ## Errors
    /// Validation errors are raised before the transaction starts. Storage
    /// errors after it started roll everything back.
    pub async fn create_sale(
        &self,
        payment: PaymentMethod,
        lines: &[CartLine],
    ) -> LedgerResult<SaleResult> {
        let total = validate_cart(lines)?;

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let event_id = active_event_id_in(&mut tx)
            .await?
            .ok_or(LedgerError::NoActiveEvent)?;

        let order_id = insert_order(&mut tx, total, payment, event_id, Utc::now()).await?;
        for line in lines {
            insert_item(&mut tx, order_id, line).await?;
        }

        tx.commit().await?;

        info!(
            order_id,
            event_id,
            payment = %payment,
            total_cents = total.cents(),
            items = lines.len(),
            "Sale recorded"
        );

        Ok(SaleResult { order_id, total })
    }

    // =========================================================================
    // Deposit Refunds
    // =========================================================================

    /// Records a deposit ("Pfand") payout.
    ///
    /// The amount is taken as given. Callers that want it checked against
    /// the configured rate use [`checked_refund`](Self::checked_refund) or
    /// [`refund_deposit_at_rate`](Self::refund_deposit_at_rate).
    pub async fn refund_deposit(&self, qty: i64, amount_cents: i64) -> LedgerResult<i64> {
        if qty <= 0 {
            return Err(LedgerError::InvalidQuantity { qty });
        }

        let refund = self.write_refund(qty, Money::from_cents(amount_cents)).await?;
        Ok(refund.id)
    }

    /// Records a refund of `qty` containers at `deposit_cents` each.
    ///
    /// The amount is computed here, so it cannot disagree with the rate.
    pub async fn refund_deposit_at_rate(
        &self,
        qty: i64,
        deposit_cents: i64,
    ) -> LedgerResult<DepositRefund> {
        let amount = deposit_amount(qty, deposit_cents)?;
        self.write_refund(qty, amount).await
    }

    /// Records a refund after checking `amount_cents == qty × deposit_cents`.
    pub async fn checked_refund(
        &self,
        qty: i64,
        amount_cents: i64,
        deposit_cents: i64,
    ) -> LedgerResult<i64> {
        check_deposit_amount(qty, amount_cents, deposit_cents)?;
        self.refund_deposit(qty, amount_cents).await
    }

    async fn write_refund(&self, qty: i64, amount: Money) -> LedgerResult<DepositRefund> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let event_id = active_event_id_in(&mut tx)
            .await?
            .ok_or(LedgerError::NoActiveEvent)?;

        let created_at = Utc::now();
        let id = sqlx::query(
            "INSERT INTO pfand_refund (qty, amount_cents, event_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(qty)
        .bind(amount.cents())
        .bind(event_id)
        .bind(created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        info!(
            refund_id = id,
            event_id,
            qty,
            amount_cents = amount.cents(),
            "Deposit refund recorded"
        );

        Ok(DepositRefund {
            id,
            qty,
            amount_cents: amount.cents(),
            event_id,
            created_at,
        })
    }

    // =========================================================================
    // Reversals
    // =========================================================================

    /// Reverses a completed order by writing its negated mirror.
    ///
    /// ## Rules
    /// - The original must exist (`OrderNotFound`)
    /// - A reversal order cannot be reversed (`CannotReverseReversal`)
    /// - An order is reversed at most once (`AlreadyReversed`)
    /// - The reversal uses the original's payment method and is attributed
    ///   to the event active now, which may differ from the original's
    pub async fn reverse_order(&self, original_order_id: i64) -> LedgerResult<ReversalResult> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let original = fetch_order(&mut tx, original_order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(original_order_id))?;

        if fetch_reversal_origin(&mut tx, original.id).await?.is_some() {
            return Err(LedgerError::CannotReverseReversal(original.id));
        }

        if let Some(link) = fetch_reversal_for(&mut tx, original.id).await? {
            return Err(LedgerError::AlreadyReversed {
                order_id: original.id,
                reversal_order_id: link.reversal_order_id,
            });
        }

        let items = fetch_items(&mut tx, original.id).await?;
        let lines = reversal_lines(&items);
        let total = lines_total(&lines)?;

        let event_id = active_event_id_in(&mut tx)
            .await?
            .ok_or(LedgerError::NoActiveEvent)?;

        let now = Utc::now();
        let reversal_order_id =
            insert_order(&mut tx, total, original.payment_method, event_id, now).await?;
        for line in &lines {
            insert_item(&mut tx, reversal_order_id, line).await?;
        }

        let linked = sqlx::query(
            "INSERT INTO order_reversals (original_order_id, reversal_order_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(original.id)
        .bind(reversal_order_id)
        .bind(now)
        .execute(&mut *tx)
        .await;

        match linked.map_err(DbError::from) {
            Ok(_) => {}
            Err(DbError::UniqueViolation { field, .. }) if field.contains("original_order_id") => {
                warn!(order_id = original.id, "Concurrent reversal detected");
                let reversal_order_id = fetch_reversal_for(&mut tx, original.id)
                    .await?
                    .map(|link| link.reversal_order_id)
                    .unwrap_or_default();
                return Err(LedgerError::AlreadyReversed {
                    order_id: original.id,
                    reversal_order_id,
                });
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;

        info!(
            original_order_id = original.id,
            reversal_order_id,
            event_id,
            total_cents = total.cents(),
            "Order reversed"
        );

        Ok(ReversalResult {
            original_order_id: original.id,
            reversal_order_id,
            total,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order by ID.
    pub async fn get_order(&self, id: i64) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// Gets the items of an order in insertion order.
    pub async fn get_items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, order_id).await
    }

    /// Returns the reversal link for an original order, if reversed.
    pub async fn get_reversal_for(&self, original_order_id: i64) -> DbResult<Option<OrderReversal>> {
        let mut conn = self.pool.acquire().await?;
        fetch_reversal_for(&mut conn, original_order_id).await
    }

    /// Returns the link whose counter-order is `reversal_order_id`, i.e.
    /// `Some` when that order is itself a reversal.
    pub async fn get_reversal_origin(&self, reversal_order_id: i64) -> DbResult<Option<OrderReversal>> {
        let mut conn = self.pool.acquire().await?;
        fetch_reversal_origin(&mut conn, reversal_order_id).await
    }

    /// Gets a deposit refund by ID.
    pub async fn get_refund(&self, id: i64) -> DbResult<Option<DepositRefund>> {
        let refund = sqlx::query_as::<_, DepositRefund>(&format!(
            "SELECT {REFUND_COLUMNS} FROM pfand_refund WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(refund)
    }

    /// Most recent orders first.
    pub async fn recent_orders(&self, limit: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = orders.len(), "Loaded recent orders");
        Ok(orders)
    }
}

// =============================================================================
// Statement Helpers
// =============================================================================
// These take a bare connection so the ledger can run them inside its
// transaction and the read API can run them on a pooled connection.

async fn insert_order(
    conn: &mut SqliteConnection,
    total: Money,
    payment: PaymentMethod,
    event_id: i64,
    created_at: DateTime<Utc>,
) -> DbResult<i64> {
    let result = sqlx::query(
        "INSERT INTO orders (total_cents, payment_method, event_id, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(total.cents())
    .bind(payment)
    .bind(event_id)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn insert_item(conn: &mut SqliteConnection, order_id: i64, line: &CartLine) -> DbResult<()> {
    // validate_cart / lines_total already proved this does not overflow
    let line_cents = line.line_total().map(|m| m.cents()).unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO order_items (order_id, product_id, name, unit_cents, qty, tax_rate_bp, line_cents)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(&line.name)
    .bind(line.unit_cents)
    .bind(line.qty)
    .bind(line.tax_rate_bp)
    .bind(line_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_order(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

async fn fetch_items(conn: &mut SqliteConnection, order_id: i64) -> DbResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

async fn fetch_reversal_for(
    conn: &mut SqliteConnection,
    original_order_id: i64,
) -> DbResult<Option<OrderReversal>> {
    let link = sqlx::query_as::<_, OrderReversal>(&format!(
        "SELECT {REVERSAL_COLUMNS} FROM order_reversals WHERE original_order_id = ?1"
    ))
    .bind(original_order_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(link)
}

async fn fetch_reversal_origin(
    conn: &mut SqliteConnection,
    reversal_order_id: i64,
) -> DbResult<Option<OrderReversal>> {
    let link = sqlx::query_as::<_, OrderReversal>(&format!(
        "SELECT {REVERSAL_COLUMNS} FROM order_reversals WHERE reversal_order_id = ?1"
    ))
    .bind(reversal_order_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(link)
}

// =============================================================================
// Unit Tests
// =============================================================================
