//! Seed script for TradeFlow.
//!
//! Populates the store with an admin account, a sample trader and a couple
//! of catalog products so the API is usable straight away.
//! Run: cargo run --bin seed_data

use tradeflow::auth::hash_password;
use tradeflow::models::Role;
use tradeflow::storage::{NewScript, ProductFields, Storage};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir =
        std::env::var("TRADEFLOW_DATA_DIR").unwrap_or_else(|_| "tradeflow_data".to_string());
    let storage = Storage::open(&data_dir)?;

    // Accounts; ignore failures so re-seeding an existing store is harmless.
    let admin = storage.create_user(
        "admin@tradeflow.dev",
        &hash_password("admin")?,
        Role::Admin,
    );
    let trader = storage.create_user(
        "trader@tradeflow.dev",
        &hash_password("trader")?,
        Role::User,
    );
    match (&admin, &trader) {
        (Ok(a), Ok(t)) => println!("Seeded accounts: admin={} trader={}", a.id, t.id),
        _ => println!("Accounts already present, skipping"),
    }

    // A pending submission for the moderation console to chew on.
    if let Ok(trader) = trader {
        let script = storage.create_script(NewScript {
            title: "RSI Divergence".to_string(),
            description: "Flags hidden divergences between price and RSI".to_string(),
            indicators: vec!["RSI".to_string(), "Volume".to_string()],
            user_id: trader.id.clone(),
            user_email: Some(trader.email.clone()),
            screenshot: None,
        })?;
        println!("Seeded pending script {}", script.id);
    }

    // Catalog samples.
    let breakout = storage.create_product(ProductFields {
        title: "Breakout Pro".to_string(),
        description: "Detects key level breaks with confirmation filters".to_string(),
        price: "49€".to_string(),
        original_price: "99€".to_string(),
        discount: "50%".to_string(),
        rating: "4.8".to_string(),
        reviews: "124".to_string(),
        compatibility: vec![
            "TradingView".to_string(),
            "MT4".to_string(),
            "MT5".to_string(),
        ],
        detailed_description: vec![
            "Exclusive algorithm with 5 confirmation factors".to_string(),
            "Real-time visual and audio alerts".to_string(),
            "Fully customizable parameters".to_string(),
        ],
        ..ProductFields::default()
    })?;
    let rsi = storage.create_product(ProductFields {
        title: "RSI Divergence".to_string(),
        description: "Automated divergence detection for reversal entries".to_string(),
        price: "19.99€".to_string(),
        compatibility: vec!["TradingView".to_string()],
        ..ProductFields::default()
    })?;
    println!("Seeded products {} and {}", breakout.id, rsi.id);

    println!("Done. Start the server with `cargo run --bin tradeflow`.");
    Ok(())
}
