//! Multi-connection ledger behaviour against a real database file.
//!
//! In-memory databases are limited to one connection, so these tests use a
//! temporary file and a pool with several connections, the way two
//! registers sharing one database would.

use std::time::Duration;

use stand_core::{CartLine, PaymentMethod, TaxRate};
use stand_db::{Database, DbConfig, LedgerError};
use tempfile::TempDir;

async fn file_db(dir: &TempDir, lock_timeout: Duration) -> Database {
    let config = DbConfig::new(dir.path().join("stand.db"))
        .max_connections(4)
        .lock_timeout(lock_timeout);
    Database::new(config).await.unwrap()
}

fn line(name: &str, cents: i64, qty: i64) -> CartLine {
    CartLine::new(name, cents, qty, TaxRate::from_bps(1900))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_are_all_recorded() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir, Duration::from_secs(5)).await;

    let mut handles = Vec::new();
    for i in 0..8_i64 {
        let ledger = db.ledger();
        handles.push(tokio::spawn(async move {
            ledger
                .create_sale(PaymentMethod::Cash, &[line("Cola 0.5L", 250, i + 1)])
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().order_id);
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8);

    let (orders, total): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(orders, 8);
    // 250 × (1 + 2 + ... + 8)
    assert_eq!(total, 250 * 36);

    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(items, 8);
}

#[tokio::test]
async fn held_write_lock_reports_busy_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir, Duration::from_millis(100)).await;

    // Another writer grabs the lock and keeps it
    let mut holder = db.pool().acquire().await.unwrap();
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *holder)
        .await
        .unwrap();

    let err = db
        .ledger()
        .create_sale(PaymentMethod::Card, &[line("Pommes", 350, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Busy), "got {err:?}");
    assert!(err.is_retryable());

    let err = db.ledger().refund_deposit(1, 50).await.unwrap_err();
    assert!(matches!(err, LedgerError::Busy), "got {err:?}");

    sqlx::query("ROLLBACK").execute(&mut *holder).await.unwrap();
    drop(holder);

    // Once released, the same call goes through
    let sale = db
        .ledger()
        .create_sale(PaymentMethod::Card, &[line("Pommes", 350, 1)])
        .await
        .unwrap();

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(orders, 1);
    assert_eq!(sale.total.cents(), 350);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_reversals_produce_one_storno() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir, Duration::from_secs(5)).await;

    let sale = db
        .ledger()
        .create_sale(PaymentMethod::Cash, &[line("Bier 0.5L", 400, 2)])
        .await
        .unwrap();

    let a = db.ledger();
    let b = db.ledger();
    let (ra, rb) = tokio::join!(a.reverse_order(sale.order_id), b.reverse_order(sale.order_id));

    let outcomes = [ra, rb];
    let ok = outcomes.iter().filter(|r| r.is_ok()).count();
    let already = outcomes
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::AlreadyReversed { .. })))
        .count();
    assert_eq!((ok, already), (1, 1));

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_reversals")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(links, 1);
}
