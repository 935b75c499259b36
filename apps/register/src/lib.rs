//! # stand-register: Headless Register for Stand POS
//!
//! Command line front end over the ledger and the receipt printer.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  stand sell "2x Pommes" --given 10                                      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  lib.rs ─────► tracing, AppConfig, Database, AppState                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  commands/ ──► sell, refund_deposit, reverse, reprint, test_print,     │
//! │                settings, products, event, backup                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Output ─────► text on stdout (or --json), errors on stderr            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exit Status
//! `0` on success. A committed operation whose slip did not print exits
//! with `3`, the same status as a failed `reprint`. Other failures use
//! [`ErrorCode::exit_status`](error::ErrorCode::exit_status).

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use stand_core::{Event, Money, PaymentMethod, Product, Setting, SettingsSnapshot};
use stand_db::Database;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::commands::backup::BackupOutcome;
use crate::commands::deposit::RefundOutcome;
use crate::commands::printer::TestPrintOutcome;
use crate::commands::reversal::{ReprintOutcome, ReversalOutcome};
use crate::commands::sale::{CheckoutOutcome, SellRequest};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::state::{AppState, PrintStatus};

// =============================================================================
// Command Line
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "stand", version, about = "Stand POS register")]
pub struct Cli {
    /// Config file (default: platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database file; overrides the config file and STAND_DB_PATH
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sell items, e.g. `stand sell "2x Pommes" "Cola 0.5L" --given 10`
    Sell {
        /// `[COUNTx] PRODUCT`, matched against the catalog by name
        #[arg(required = true, value_name = "ITEM")]
        items: Vec<String>,

        /// cash | card (bar | karte)
        #[arg(long, short, default_value = "cash", value_parser = parse_payment)]
        payment: PaymentMethod,

        /// Cash handed over, e.g. `10` or `12,50`
        #[arg(long, value_parser = parse_money)]
        given: Option<Money>,

        /// Book the sale without printing
        #[arg(long)]
        no_print: bool,
    },

    /// Pay out returned deposit containers
    RefundDeposit {
        #[arg(allow_negative_numbers = true)]
        qty: i64,

        /// Expected payout; rejected unless it equals qty × deposit rate
        #[arg(long, value_parser = parse_money)]
        amount: Option<Money>,

        #[arg(long)]
        no_print: bool,
    },

    /// Reverse (storno) a completed order
    Reverse {
        order_id: i64,

        #[arg(long)]
        no_print: bool,
    },

    /// Print an order's receipt again
    Reprint { order_id: i64 },

    /// Print the test page on the configured printer
    TestPrint,

    /// Show or change business settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// List the active catalog
    Products,

    /// Show the active event, or switch to NAME
    Event { name: Option<String> },

    /// Copy the database to FILE (default: backups/ next to the database)
    Backup {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Get { key: String },
    Set { key: String, value: String },
    Show,
}

fn parse_money(raw: &str) -> Result<Money, String> {
    Money::parse_euro(raw).map_err(|e| e.to_string())
}

fn parse_payment(raw: &str) -> Result<PaymentMethod, String> {
    raw.parse::<PaymentMethod>().map_err(|e| e.to_string())
}

// =============================================================================
// Output
// =============================================================================

/// Result of one command, rendered as text or JSON.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Output {
    Checkout(CheckoutOutcome),
    Refund(RefundOutcome),
    Reversal(ReversalOutcome),
    Reprint(ReprintOutcome),
    TestPrint(TestPrintOutcome),
    Setting(Setting),
    Snapshot(SettingsSnapshot),
    Settings(Vec<Setting>),
    Products(Vec<Product>),
    Event(Event),
    Backup(BackupOutcome),
}

impl Output {
    /// Slip status of a committed operation.
    pub fn print_status(&self) -> Option<&PrintStatus> {
        match self {
            Output::Checkout(o) => Some(&o.print),
            Output::Refund(o) => Some(&o.print),
            Output::Reversal(o) => Some(&o.print),
            _ => None,
        }
    }

    /// Human-readable rendering.
    pub fn render(&self) -> String {
        match self {
            Output::Checkout(o) => o.to_string(),
            Output::Refund(o) => o.to_string(),
            Output::Reversal(o) => o.to_string(),
            Output::Reprint(o) => o.to_string(),
            Output::TestPrint(o) => o.to_string(),
            Output::Setting(s) => s.value.clone(),
            Output::Snapshot(s) => format!(
                "deposit_cents = {}\nprinter_backend = {}\nreceipt_width = {}",
                s.deposit_cents, s.printer_backend, s.receipt_width
            ),
            Output::Settings(all) => all
                .iter()
                .map(|s| format!("{} = {}", s.key, s.value))
                .collect::<Vec<_>>()
                .join("\n"),
            Output::Products(products) => products
                .iter()
                .map(commands::products::format_row)
                .collect::<Vec<_>>()
                .join("\n"),
            Output::Event(e) => format!("#{} {}", e.id, e.name),
            Output::Backup(o) => o.to_string(),
        }
    }
}

// =============================================================================
// Entry
// =============================================================================

/// Runs one command against an open register.
pub async fn dispatch(state: &AppState, command: Command) -> AppResult<Output> {
    let output = match command {
        Command::Sell {
            items,
            payment,
            given,
            no_print,
        } => Output::Checkout(
            commands::sale::sell(
                state,
                SellRequest {
                    items,
                    payment,
                    given,
                    print: !no_print,
                },
            )
            .await?,
        ),
        Command::RefundDeposit {
            qty,
            amount,
            no_print,
        } => Output::Refund(commands::deposit::refund_deposit(state, qty, amount, !no_print).await?),
        Command::Reverse { order_id, no_print } => {
            Output::Reversal(commands::reversal::reverse(state, order_id, !no_print).await?)
        }
        Command::Reprint { order_id } => {
            Output::Reprint(commands::reversal::reprint(state, order_id).await?)
        }
        Command::TestPrint => Output::TestPrint(commands::printer::test_print(state).await?),
        Command::Settings { action } => match action {
            SettingsCommand::Get { key } => Output::Setting(commands::settings::get(state, &key).await?),
            SettingsCommand::Set { key, value } => {
                Output::Snapshot(commands::settings::set(state, &key, &value).await?)
            }
            SettingsCommand::Show => Output::Settings(commands::settings::show(state).await?),
        },
        Command::Products => Output::Products(commands::products::list(state).await?),
        Command::Event { name: None } => Output::Event(commands::event::active(state).await?),
        Command::Event { name: Some(name) } => {
            Output::Event(commands::event::activate(state, &name).await?)
        }
        Command::Backup { file } => Output::Backup(commands::backup::backup(state, file).await?),
    };

    Ok(output)
}

/// Opens the register described by `cli` and runs its command.
pub async fn execute(cli: Cli) -> AppResult<Output> {
    let mut config = AppConfig::load(cli.config)?;
    if let Some(path) = cli.db {
        config.database.path = Some(path);
    }

    let path = config.database_path()?;
    let db = Database::new(config.db_config(&path)).await?;

    let seeded = db.products().seed_defaults_if_empty().await?;
    if seeded > 0 {
        info!(count = seeded, "Seeded default catalog");
    }

    let state = AppState::new(db, config);
    let result = dispatch(&state, cli.command).await;
    state.db.close().await;
    result
}

/// Process entry: parse, run, print, exit.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let json = cli.json;
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: cannot start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(cli)) {
        Ok(output) => {
            if json {
                match serde_json::to_string_pretty(&output) {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("error: cannot serialize output: {e}"),
                }
            } else {
                println!("{}", output.render());
            }

            match output.print_status() {
                Some(PrintStatus::Failed { backend, error }) => {
                    eprintln!("warning: booked, but the slip was not printed on '{backend}': {error}");
                    ExitCode::from(ErrorCode::Printer.exit_status())
                }
                _ => ExitCode::SUCCESS,
            }
        }
        Err(err) => {
            report_error(&err, json);
            err.exit_code()
        }
    }
}

fn report_error(err: &AppError, json: bool) {
    if json {
        if let Ok(text) = serde_json::to_string(err) {
            println!("{text}");
            return;
        }
    }
    eprintln!("{}", err.report_line());
}

/// Initializes tracing on stderr so stdout carries only command output.
///
/// ## Log Levels
/// - Default: `info,stand=debug,sqlx=warn`
/// - Override with the `RUST_LOG` environment variable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stand=debug,sqlx=warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
