//! # Seed Data Generator
//!
//! Populates the product catalog of a stand database.
//!
//! ## Usage
//! ```bash
//! # Default catalog (Pommes, Cola 0.5L, Pfand)
//! cargo run -p stand-db --bin seed
//!
//! # Add a fuller festival menu on top
//! cargo run -p stand-db --bin seed -- --demo
//!
//! # Specify database path
//! cargo run -p stand-db --bin seed -- --db ./data/stand.db
//! ```
//!
//! The database file is created and migrated if needed, which also seeds the
//! default settings and the "Standard" event.

use std::env;
use stand_core::TaxRate;
use stand_db::{Database, DbConfig, NewProduct};

/// Festival menu: (category, name, price in cents, tax in basis points)
const DEMO_MENU: &[(&str, &str, i64, u32)] = &[
    ("ESSEN", "Bratwurst", 400, 700),
    ("ESSEN", "Currywurst", 450, 700),
    ("ESSEN", "Pommes groß", 450, 700),
    ("ESSEN", "Steak im Brötchen", 650, 700),
    ("GETRÄNK", "Wasser 0.5L", 200, 1900),
    ("GETRÄNK", "Apfelschorle 0.5L", 250, 1900),
    ("GETRÄNK", "Bier 0.5L", 400, 1900),
    ("GETRÄNK", "Kaffee", 200, 1900),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut demo = false;
    let mut db_path = String::from("./stand_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--demo" => demo = true,
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stand POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --demo             Also insert a festival demo menu");
                println!("  -d, --db <PATH>    Database file path (default: ./stand_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {other}");
            }
        }
        i += 1;
    }

    println!("🌱 Stand POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let event = db.events().active_event().await?;
    println!("✓ Active event: {} (#{})", event.name, event.id);

    let inserted = db.products().seed_defaults_if_empty().await?;
    if inserted == 0 {
        println!("⚠ Catalog already has products, default catalog skipped");
    } else {
        println!("✓ Inserted {} default products", inserted);
    }

    if demo {
        let mut added = 0;
        for (category, name, price_cents, tax_bps) in DEMO_MENU {
            if db.products().find_by_name(name).await?.is_some() {
                continue;
            }
            let product = NewProduct::new(*name, *price_cents, TaxRate::from_bps(*tax_bps))
                .category(*category);
            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", name, e);
                continue;
            }
            added += 1;
        }
        println!("✓ Inserted {} demo products", added);
    }

    println!();
    for product in db.products().list_active().await? {
        println!(
            "  #{:<3} {:<24} {:>10}  {}",
            product.id,
            product.name,
            stand_core::Money::from_cents(product.price_cents).to_string(),
            TaxRate::from_bps(product.tax_rate_bp)
        );
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
