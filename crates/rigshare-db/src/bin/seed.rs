//! # Seed Data Generator
//!
//! Populates a database with demo accounts and listings for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p rigshare-db --bin seed
//!
//! # Specify database path
//! cargo run -p rigshare-db --bin seed -- --db ./data/rigshare.db
//! ```
//!
//! ## Generated Data
//! - John Doe and Jane Smith, both with password `password123`
//! - Three of John's listings: a camera body, a lens and a tripod

use std::env;

use rigshare_core::{DeliveryOptions, NewEquipment};
use rigshare_db::{Database, DbConfig};

const DEMO_PASSWORD: &str = "password123";

/// (name, email)
const USERS: &[(&str, &str)] = &[
    ("John Doe", "john@example.com"),
    ("Jane Smith", "jane@example.com"),
];

/// (name, description, daily cents, category, location, delivery, shipping)
const LISTINGS: &[(&str, &str, i64, &str, &str, bool, bool)] = &[
    (
        "Sony A7III",
        "Full-frame mirrorless camera, two batteries and a 128GB card.",
        7500,
        "Cameras",
        "Los Angeles, CA",
        true,
        false,
    ),
    (
        "Canon 24-70mm f/2.8L II",
        "Standard zoom, EF mount. Lens hood and caps included.",
        4500,
        "Lenses",
        "Los Angeles, CA",
        false,
        true,
    ),
    (
        "Manfrotto 055 Tripod",
        "Aluminium tripod with fluid video head.",
        2500,
        "Support",
        "Pasadena, CA",
        false,
        false,
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./rigshare.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("RigShare Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./rigshare.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("RigShare Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} users", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut owner_id = None;
    for (name, email) in USERS {
        let user = db.users().create(name, email, DEMO_PASSWORD).await?;
        println!("  + user {} <{}> ({})", user.name, user.email, user.id);
        owner_id.get_or_insert(user.id);
    }
    let owner_id = owner_id.ok_or("no users to own the listings")?;

    for (name, description, price_cents, category, location, delivery, shipping) in LISTINGS {
        let listing = NewEquipment {
            name: name.to_string(),
            description: description.to_string(),
            price_cents: *price_cents,
            category: category.to_string(),
            location: location.to_string(),
            image: None,
            delivery_options: DeliveryOptions {
                pickup: true,
                delivery: *delivery,
                shipping: *shipping,
            },
        };
        let created = db.equipment().create(&listing, &owner_id).await?;
        println!("  + {} at {}/day", created.name, created.daily_rate());
    }

    println!();
    println!(
        "✓ Seeded {} users and {} listings",
        db.users().count().await?,
        db.equipment().count().await?
    );

    db.close().await;
    Ok(())
}
