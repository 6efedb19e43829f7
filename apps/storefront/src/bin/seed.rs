//! # Seed Data Generator
//!
//! Populates the database with sample products, sales and carts for
//! development. Everything goes through the same handlers a transport would
//! call, so every row obeys the discount and quantity rules.
//!
//! ## Usage
//! ```bash
//! # 40 products (default), database from STOREFRONT_DATABASE_PATH
//! cargo run -p storefront-app --bin seed
//!
//! # Custom amount and path
//! cargo run -p storefront-app --bin seed -- --products 200 --db ./data/storefront.db
//! ```
//!
//! ## Generated Data
//! - Products across five categories, priced 4.99 to 124.99
//! - One sale and one cart per eight products, with quantities spread over
//!   all three discount tiers

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use storefront_app::orders::{CreateOrderCommand, OrderLineInput};
use storefront_app::products::{CreateProductCommand, ListProductsQuery, ProductDetails};
use storefront_app::{telemetry, AppConfig, Storefront};
use storefront_core::Rating;

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "electronics",
        &["USB-C Hub", "Wireless Mouse", "Mechanical Keyboard", "27in Monitor", "SSD 1TB"],
    ),
    (
        "jewelery",
        &["Silver Ring", "Gold Chain", "Pearl Earrings", "Charm Bracelet"],
    ),
    (
        "men's clothing",
        &["Slim Fit Shirt", "Cotton Jacket", "Casual Tee", "Rain Coat"],
    ),
    (
        "women's clothing",
        &["Moto Jacket", "Short Sleeve Top", "Rain Jacket", "Boat Neck Tee"],
    ),
    (
        "home",
        &["Ceramic Mug", "Desk Lamp", "Throw Blanket", "Wall Clock", "Plant Pot"],
    ),
];

const BRANCHES: &[&str] = &["Downtown", "Airport", "Harbor", "Online"];

/// Quantities chosen to hit every discount tier.
const QUANTITIES: &[i32] = &[1, 3, 4, 7, 10, 20];

const DEFAULT_PRODUCTS: usize = 40;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut count = DEFAULT_PRODUCTS;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                let value = args.get(i + 1).context("--products needs a value")?;
                count = value
                    .parse()
                    .with_context(|| format!("invalid product count: {}", value))?;
                i += 1;
            }
            "--db" | "-d" => {
                let value = args.get(i + 1).context("--db needs a value")?;
                db_path = Some(PathBuf::from(value));
                i += 1;
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>  Number of products to generate (default: 40)");
                println!("  -d, --db <PATH>     Database file path (default: STOREFRONT_DATABASE_PATH)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {}", other),
        }
        i += 1;
    }

    let mut config = AppConfig::load().context("loading configuration")?;
    if let Some(path) = db_path {
        config.database_path = path;
    }
    telemetry::init_tracing(&config.log_filter);

    println!("Storefront Seed Data Generator");
    println!("==============================");
    println!("Database: {}", config.database_path.display());
    println!("Products: {}", count);
    println!();

    let store = Storefront::connect(&config)
        .await
        .context("opening database")?;
    println!("✓ Connected to database");

    let existing = store
        .products()
        .list(ListProductsQuery::default())
        .await?
        .total_items;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = Instant::now();

    println!("Generating products...");
    let mut products = Vec::with_capacity(count);
    for seed in 0..count {
        let created = store.products().create(generate_product(seed)).await?;
        products.push(created);
    }
    println!("✓ Generated {} products", products.len());

    println!("Generating sales and carts...");
    let mut sales = 0;
    let mut carts = 0;
    for (batch, chunk) in products.chunks(8).enumerate() {
        store.sales().create(generate_order("S", batch, chunk)).await?;
        sales += 1;
        store.carts().create(generate_order("C", batch, chunk)).await?;
        carts += 1;
    }
    println!("✓ Generated {} sales and {} carts", sales, carts);

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());
    Ok(())
}

/// Generates a single product with deterministic data.
fn generate_product(seed: usize) -> CreateProductCommand {
    let (category, names) = CATEGORIES[seed % CATEGORIES.len()];
    let name = names[(seed / CATEGORIES.len()) % names.len()];

    // 4.99 - 124.99
    let cents = 499 + ((seed * 1_733) % 12_000) as i64;
    // 2.0 - 5.0
    let rate = Decimal::new(20 + (seed % 31) as i64, 1);

    CreateProductCommand {
        title: format!("{} #{}", name, seed + 1),
        price: Decimal::new(cents, 2),
        description: format!("{} from the {} range.", name, category),
        category: category.to_string(),
        image: format!("https://img.storefront.test/{}.png", seed + 1),
        rating: Rating::new(rate, ((seed * 37) % 500) as i32),
    }
}

/// Builds one order over `products`, taking at most four lines.
fn generate_order(prefix: &str, batch: usize, products: &[ProductDetails]) -> CreateOrderCommand {
    let items = products
        .iter()
        .take(4)
        .enumerate()
        .map(|(line, product)| {
            OrderLineInput::new(
                product.id,
                QUANTITIES[(batch + line) % QUANTITIES.len()],
                product.price,
            )
        })
        .collect();

    CreateOrderCommand {
        number: format!("{}-{:05}", prefix, batch + 1),
        date: Utc::now() - Duration::hours(batch as i64),
        customer_id: Uuid::new_v4(),
        branch: BRANCHES[batch % BRANCHES.len()].to_string(),
        items,
    }
}
