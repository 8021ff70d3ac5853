//! # Seed Data Generator
//!
//! Populates a database with a development catalog and, optionally, a few
//! days of sales so the analytics views have something to show.
//!
//! ## Usage
//! ```bash
//! # 200 products (default)
//! cargo run -p tally-db --bin seed
//!
//! # Custom amount, plus sample sales
//! cargo run -p tally-db --bin seed -- --count 1000 --sales 50
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! Each product gets a `{category}{index}` barcode, a price between $0.99
//! and $12.99 and a stock level between 0 and 60.

use std::env;
use tally_core::{CartItem, Discount, NewProduct, Product};
use tally_db::{Database, DbConfig};

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "10",
        &[
            "Espresso",
            "Americano",
            "Flat White",
            "Cappuccino",
            "Oat Latte",
            "Cold Brew",
            "Chai Latte",
            "Hot Chocolate",
            "Green Tea",
            "Lemonade",
        ],
    ),
    (
        "20",
        &[
            "Croissant",
            "Pain au Chocolat",
            "Bagel",
            "Blueberry Muffin",
            "Banana Bread",
            "Cinnamon Roll",
            "Scone",
            "Brownie",
            "Cookie",
            "Granola Bar",
        ],
    ),
    (
        "30",
        &[
            "Ham Sandwich",
            "Veggie Wrap",
            "Chicken Panini",
            "Soup of the Day",
            "Caesar Salad",
            "Quiche",
            "Toastie",
            "Fruit Cup",
            "Yogurt Pot",
            "Sparkling Water",
        ],
    ),
];

const SIZES: &[(&str, i64)] = &[("", 0), ("Large", 80), ("Family", 250), ("Mini", -40)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut sales: usize = 0;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse()?;
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
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -s, --sales <N>    Number of sample sales to record (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    println!("Tally POS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!("Sales:    {}", sales);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count("").await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for (category, names) in CATEGORIES {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = generated + name_idx * 7 + size_idx;
                let product = generate_product(category, name, size, *price_addon, generated, seed);

                if let Err(e) = db.products().add(&product).await {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }

                generated += 1;
            }
        }
    }

    // More products than name × size combinations: number the rest
    while generated < count {
        let product = generate_product("99", "Item", &format!("#{}", generated), 0, generated, generated);
        db.products().add(&product).await?;
        generated += 1;
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    if sales > 0 {
        println!();
        println!("Recording sample sales...");

        let catalog = db.products().get_all().await?;
        let engine = db.transactions();
        let mut recorded = 0;

        for n in 0..sales {
            let cart = sample_cart(&catalog, n);
            if cart.is_empty() {
                break;
            }

            let discount = match n % 5 {
                0 => Some(Discount::percent(10)),
                3 => Some(Discount::fixed(100)),
                _ => None,
            };

            match engine.create_sale(&cart, discount).await {
                Ok(receipt) => {
                    recorded += 1;
                    // Void roughly one in eight so the history shows both states
                    if n % 8 == 7 {
                        engine.void_sale(receipt.sale_id).await?;
                    }
                }
                Err(e) => eprintln!("Failed to record sale {}: {}", n, e),
            }
        }

        let today = db.analytics().today_stats().await?;
        println!("✓ Recorded {} sales", recorded);
        println!(
            "  Today: {} orders, {} cents revenue",
            today.order_count, today.revenue_cents
        );
    }

    println!();
    println!("Verifying search...");
    let page = db.products().search("latte", 1, 10).await?;
    println!("  Search 'latte': {} results", page.total);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with plausible data.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    index: usize,
    seed: usize,
) -> NewProduct {
    let name = if size.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, size)
    };

    let base_price = 99 + ((seed * 37) % 1100) as i64;

    NewProduct {
        name,
        price_cents: (base_price + price_addon).max(0),
        stock: ((seed * 13) % 61) as i64,
        detail: String::new(),
        barcode: format!("{}{:08}", category, index),
    }
}

/// Picks one to three catalog lines for sample sale `n`.
fn sample_cart(catalog: &[Product], n: usize) -> Vec<CartItem> {
    if catalog.is_empty() {
        return Vec::new();
    }

    let lines = 1 + n % 3;
    (0..lines)
        .map(|line| {
            let product = &catalog[(n * 31 + line * 17) % catalog.len()];
            product.to_cart_item(1 + ((n + line) % 3) as i64)
        })
        .collect()
}
