//! Seed data script - populates the database with demo products, locations
//! and stock records
//!
//! Run with: cargo run --bin seed-data

use inventory_api::{
    config, db,
    entities::{location, product},
    repositories::{InventoryRepository, LocationRepository, ProductRepository},
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("=== Inventory API Seed Data ===");
    let pool = db::establish_connection_from_app_config(&cfg).await?;
    db::run_migrations(&pool).await?;

    let products = db::with_transaction(&pool, |txn| {
        Box::pin(async move {
            let mut created = Vec::new();
            for (name, sku, description) in PRODUCTS {
                let product = match ProductRepository::get_by_sku(txn, sku).await? {
                    Some(existing) => existing,
                    None => {
                        ProductRepository::create(
                            txn,
                            name.to_string(),
                            sku.to_string(),
                            Some(description.to_string()),
                        )
                        .await?
                    }
                };
                created.push(product);
            }
            Ok(created)
        })
    })
    .await?;
    info!("  {} products ready", products.len());

    let locations = db::with_transaction(&pool, |txn| {
        Box::pin(async move {
            let mut created = Vec::new();
            for (name, address, capacity) in LOCATIONS {
                created.push(
                    LocationRepository::create(txn, name.to_string(), address.to_string(), capacity)
                        .await?,
                );
            }
            Ok(created)
        })
    })
    .await?;
    info!("  {} locations created", locations.len());

    let records = seed_stock(&pool, &products, &locations).await?;
    info!("  {} stock records written", records);

    info!("=== Seed Data Complete ===");
    info!("Try: curl http://localhost:{}/inventory/low-stock", cfg.port);

    db::close_pool(pool).await?;
    Ok(())
}

const PRODUCTS: [(&str, &str, &str); 6] = [
    ("Wireless Bluetooth Headphones", "WBH-001", "Over-ear headphones with 30-hour battery life."),
    ("USB-C Fast Charger 65W", "CHG-065", "GaN charger for laptops, phones and tablets."),
    ("Mechanical Keyboard RGB", "KBD-RGB", "Hot-swappable mechanical keyboard."),
    ("Classic Cotton T-Shirt", "TSH-BLK-M", "Organic cotton t-shirt."),
    ("Canvas Backpack 25L", "BAG-CNV-25", "Water-resistant backpack with laptop sleeve."),
    ("Stainless Steel Water Bottle", "BTL-SS-32", "32oz double-wall insulated bottle."),
];

const LOCATIONS: [(&str, &str, i32); 3] = [
    ("Central Warehouse", "100 Distribution Way, Reno", 50_000),
    ("East Coast Hub", "42 Harbor Street, Newark", 20_000),
    ("Downtown Store", "7 Market Square, Portland", 1_500),
];

/// Every product at every location; the last location is left short so the
/// low-stock report has something to show.
async fn seed_stock(
    pool: &db::DbPool,
    products: &[product::Model],
    locations: &[location::Model],
) -> anyhow::Result<usize> {
    let pairs: Vec<(i32, i32, i32)> = products
        .iter()
        .enumerate()
        .flat_map(|(p, product)| {
            locations.iter().enumerate().map(move |(l, location)| {
                let quantity = if l + 1 == locations.len() {
                    (p as i32) * 2
                } else {
                    100 + (p as i32) * 25
                };
                (product.id, location.id, quantity)
            })
        })
        .collect();

    let count = pairs.len();
    db::with_transaction(pool, move |txn| {
        Box::pin(async move {
            for (product_id, location_id, quantity) in pairs {
                InventoryRepository::set_stock(txn, product_id, location_id, quantity, Some(10))
                    .await?;
            }
            Ok(())
        })
    })
    .await?;

    Ok(count)
}
