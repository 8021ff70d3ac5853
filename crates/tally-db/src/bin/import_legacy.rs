//! # Legacy Import
//!
//! Moves a database written by the earlier till application into a new
//! Tally database.
//!
//! ## Usage
//! ```bash
//! cargo run -p tally-db --bin import-legacy -- --from ./old/pos.db --db ./data/tally.db
//! ```
//!
//! The target is created and migrated if needed and must not hold any
//! products or sales yet.

use std::env;
use tally_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut from: Option<String> = None;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--from" | "-f" => {
                if i + 1 < args.len() {
                    from = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    let Some(from) = from else {
        print_usage();
        return Err("--from is required".into());
    };

    println!("Tally POS Legacy Import");
    println!("=======================");
    println!("From: {}", from);
    println!("Into: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let summary = db.import_legacy(&from).await?;

    println!("✓ Imported {} products", summary.products);
    println!("✓ Imported {} sales", summary.sales);

    let today = db.analytics().today_stats().await?;
    println!(
        "  Today: {} orders, {} cents revenue",
        today.order_count, today.revenue_cents
    );

    db.close().await;
    Ok(())
}

fn print_usage() {
    println!("Usage: import-legacy --from <PATH> [--db <PATH>]");
    println!();
    println!("Options:");
    println!("  -f, --from <PATH>  Legacy database to read");
    println!("  -d, --db <PATH>    Tally database to fill (default: ./tally_dev.db)");
    println!("  -h, --help         Show this help message");
}
