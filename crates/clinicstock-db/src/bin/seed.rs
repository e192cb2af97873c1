//! # Seed Data Generator
//!
//! Populates the database with a demo clinic for development.
//!
//! ## Usage
//! ```bash
//! # Demo clinic with 40 items (default)
//! cargo run -p clinicstock-db --bin seed
//!
//! # Custom item count
//! cargo run -p clinicstock-db --bin seed -- --count 200
//!
//! # Specify database path (otherwise CLINICSTOCK_DB_PATH or ./clinicstock_dev.db)
//! cargo run -p clinicstock-db --bin seed -- --db ./data/clinicstock.db
//! ```
//!
//! ## Generated Data
//! One professional-tier organization with categories, three storage
//! locations, an owner and a nurse, and items whose expiration dates are
//! spread from a few weeks in the past to about a year ahead, so every
//! status shows up on the dashboard.

use chrono::{Duration, Utc};
use std::env;
use tracing_subscriber::EnvFilter;

use clinicstock_core::{MemberRole, NewItem, PlanTier};
use clinicstock_db::{AppConfig, Database};

/// Item catalog: (category, name, unit cost).
const CATALOG: &[(&str, &str, &str)] = &[
    ("Toxins", "Botox 100U", "420.00"),
    ("Toxins", "Dysport 300U", "510.00"),
    ("Toxins", "Xeomin 100U", "395.00"),
    ("Fillers", "Juvederm Ultra 1ml", "189.50"),
    ("Fillers", "Restylane Lyft 1ml", "205.00"),
    ("Fillers", "Sculptra vial", "310.00"),
    ("Fillers", "Radiesse 1.5ml", "265.00"),
    ("Anesthetics", "Lidocaine 2% 5ml", "8.40"),
    ("Anesthetics", "Topical numbing cream 30g", "24.99"),
    ("Consumables", "Syringes 1ml (box of 100)", "18.00"),
    ("Consumables", "Cannula 25G (box of 20)", "64.00"),
    ("Consumables", "Nitrile gloves (box of 100)", "11.50"),
    ("Consumables", "Alcohol swabs (box of 200)", "6.25"),
    ("Skincare", "Vitamin C serum 30ml", "42.00"),
    ("Skincare", "SPF 50 sunscreen", "19.00"),
];

const LOCATIONS: &[(&str, &str)] = &[
    ("Main fridge", "Treatment room 1, 2-8°C"),
    ("Treatment room 2", "Cabinet under the sink"),
    ("Back office", "Dry storage shelves"),
];

/// Expiry offsets in days, cycled through the catalog.
const EXPIRY_OFFSETS: &[i64] = &[-20, -3, 5, 14, 27, 45, 90, 180, 365];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,clinicstock=debug,sqlx=warn")),
        )
        .init();

    let mut config = AppConfig::load()?;

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut count: usize = 40;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ClinicStock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of items to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./clinicstock_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 ClinicStock Seed Data Generator");
    println!("==================================");
    println!("Database: {}", config.database_path.display());
    println!("Items:    {}", count);
    println!();

    let db = Database::new(config.db_config()).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.organizations().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} organizations", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let org = db
        .organizations()
        .create_with_settings(
            "Glow Aesthetics",
            PlanTier::Professional,
            config.default_settings(""),
        )
        .await?;
    println!("✓ Created organization {} ({})", org.name, org.plan_tier);

    db.members()
        .add(&org.id, "owner@glow.example", Some("Dr. Rivera"), MemberRole::Owner)
        .await?;
    db.members()
        .add(&org.id, "nurse@glow.example", Some("Sam Lee"), MemberRole::Staff)
        .await?;

    let mut category_ids = Vec::new();
    for name in ["Toxins", "Fillers", "Anesthetics", "Consumables", "Skincare"] {
        let category = db.categories().insert(&org.id, name).await?;
        category_ids.push((name, category.id));
    }

    let mut location_ids = Vec::new();
    for &(name, description) in LOCATIONS {
        let location = db.locations().insert(&org.id, name, Some(description)).await?;
        location_ids.push(location.id);
    }

    println!();
    println!("Generating items...");

    let today = Utc::now();
    let start = std::time::Instant::now();
    let mut generated = 0;

    for seed in 0..count {
        let input = generate_item(seed, today, &category_ids, &location_ids);
        if let Err(e) = db.items().insert(&org.id, &input).await {
            eprintln!("Failed to insert {}: {}", input.name, e);
            continue;
        }
        generated += 1;
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} items in {:?}", generated, elapsed);

    // Run the reports once as a smoke test
    let now = Utc::now();
    let overview = db.reports().overview(&org.id, now).await?;
    let summary = overview.summary;

    println!();
    println!("Dashboard summary");
    println!("  Total items:   {}", summary.total_items);
    println!("  Total value:   {}", summary.total_value);
    println!("  Expired:       {}", summary.expired);
    println!("  Expiring soon: {}", summary.expiring_soon);
    println!("  Low stock:     {}", summary.low_stock);

    let waste = db
        .reports()
        .waste(&org.id, config.waste_window_days, now)
        .await?;
    println!(
        "  Waste (last {} days): {} items, {}",
        waste.window_days, waste.waste_count, waste.total_waste_value
    );

    let alerts = db.reports().alerts(&org.id, now).await?;
    println!("  Alerts:        {}", alerts.len());

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Builds one deterministic item from the catalog.
fn generate_item(
    seed: usize,
    today: chrono::DateTime<Utc>,
    categories: &[(&str, String)],
    locations: &[String],
) -> NewItem {
    let (category, name, unit_cost) = CATALOG[seed % CATALOG.len()];
    let batch = seed / CATALOG.len();

    let category_id = categories
        .iter()
        .find(|(n, _)| *n == category)
        .map(|(_, id)| id.clone());
    let location_id = locations.get(seed % locations.len().max(1)).cloned();

    let offset = EXPIRY_OFFSETS[(seed * 7 + batch) % EXPIRY_OFFSETS.len()];
    let expiration_date = (today + Duration::days(offset)).date_naive();

    // 0-60 on hand, with a few items set to trip low stock
    let quantity = ((seed * 13) % 61) as i64;
    let reorder_threshold = match seed % 4 {
        0 => None,
        1 => Some(5),
        2 => Some(20),
        _ => Some(0),
    };

    NewItem {
        name: if batch == 0 {
            name.to_string()
        } else {
            format!("{} (lot {})", name, batch + 1)
        },
        sku: Some(format!("{}-{:04}", category[..3].to_uppercase(), seed)),
        category_id,
        location_id,
        lot_number: Some(format!("L{}{:03}", today.format("%y"), seed)),
        quantity,
        unit_cost: unit_cost.to_string(),
        expiration_date,
        reorder_threshold,
    }
}
