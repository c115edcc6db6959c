//! # Seed Data Generator
//!
//! Populates a development database with accounts, categories and products.
//!
//! ## Usage
//! ```bash
//! # Seed ./data/tally.db
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/dev.db
//! ```
//!
//! ## Seeded Accounts
//! ```text
//! ┌──────────┬───────────────────────┬──────────┬─────────┐
//! │ username │ email                 │ password │ role    │
//! ├──────────┼───────────────────────┼──────────┼─────────┤
//! │ admin    │ admin@tally.local     │ admin123 │ admin   │
//! │ kasir1   │ kasir1@tally.local    │ kasir123 │ cashier │
//! └──────────┴───────────────────────┴──────────┴─────────┘
//! ```

use std::collections::HashMap;
use std::env;

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use tally_core::{ProductInput, Role, UserInput};
use tally_db::{Database, DbConfig};

const ACCOUNTS: &[(&str, &str, Role)] = &[
    ("admin", "admin123", Role::Admin),
    ("kasir1", "kasir123", Role::Cashier),
];

const CATEGORIES: &[&str] = &["Beverages", "Snacks", "Dairy", "Household"];

/// (category, name, barcode, price in cents, stock)
const PRODUCTS: &[(&str, &str, &str, i64, i64)] = &[
    ("Beverages", "Coca-Cola 330ml", "5449000000996", 999, 48),
    ("Beverages", "Mineral Water 600ml", "8992752000017", 350, 120),
    ("Beverages", "Iced Tea 350ml", "8996001600146", 575, 36),
    ("Snacks", "Potato Chips 68g", "8886013100011", 1250, 24),
    ("Snacks", "Chocolate Bar 45g", "7622210449283", 899, 8),
    ("Snacks", "Salted Peanuts 100g", "8992775000101", 650, 30),
    ("Dairy", "UHT Milk 1L", "8992761111014", 1850, 18),
    ("Dairy", "Yogurt Cup 150g", "8992761133016", 725, 6),
    ("Household", "Dish Soap 800ml", "8998866200578", 2150, 12),
    ("Household", "Tissue Pack", "8993053131016", 1599, 40),
];

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./data/tally.db");

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
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/tally.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("Failed to open database")?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().count().await? > 0 || db.products().count().await? > 0 {
        println!("⚠ Database already has data");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (username, password, role) in ACCOUNTS {
        let input = UserInput {
            username: username.to_string(),
            email: format!("{username}@tally.local"),
            password_hash: Some(hash_password(password)?),
            role: *role,
        };
        db.users()
            .create(&input)
            .await
            .with_context(|| format!("Failed to create user {username}"))?;
        println!("✓ User {} ({})", username, role.as_str());
    }

    let mut category_ids = HashMap::new();
    for name in CATEGORIES {
        let category = db.categories().create(name).await?;
        category_ids.insert(*name, category.id);
    }
    println!("✓ {} categories", category_ids.len());

    let mut created = 0;
    for (category, name, barcode, price_cents, stock) in PRODUCTS {
        let input = ProductInput {
            name: name.to_string(),
            description: None,
            price_cents: *price_cents,
            stock: *stock,
            category_id: category_ids.get(category).copied(),
            barcode: Some(barcode.to_string()),
            is_active: true,
        };

        if let Err(e) = db.products().create(&input).await {
            eprintln!("Failed to insert {}: {}", name, e);
            continue;
        }
        created += 1;
    }
    println!("✓ {} products", created);

    db.close().await;

    println!();
    println!("🎉 Seed complete!");

    Ok(())
}
