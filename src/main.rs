//! TradeFlow server.
//!
//! Serves the storefront, submission and moderation REST API on one Axum
//! listener. Configuration comes from the environment (optionally a .env
//! file):
//!   TRADEFLOW_ADDR       listen address (default 0.0.0.0:11111)
//!   TRADEFLOW_DATA_DIR   Sled database directory (default tradeflow_data)
//!   TRADEFLOW_FILES_DIR  uploaded media directory (default tradeflow_files)
//!   TRADEFLOW_JWT_SECRET session token signing secret
//!
//! Usage:
//!   cargo run --bin seed_data    # populate an admin account + samples
//!   cargo run --bin tradeflow    # start the server

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tradeflow::files::FileStore;
use tradeflow::rest::create_router;
use tradeflow::storage::Storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tradeflow=info")),
        )
        .init();

    let addr: SocketAddr = std::env::var("TRADEFLOW_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:11111".to_string())
        .parse()?;
    let data_dir =
        std::env::var("TRADEFLOW_DATA_DIR").unwrap_or_else(|_| "tradeflow_data".to_string());
    let files_dir =
        std::env::var("TRADEFLOW_FILES_DIR").unwrap_or_else(|_| "tradeflow_files".to_string());

    let storage = Storage::open(&data_dir)?;
    let files = FileStore::open(&files_dir)?;
    let app = create_router(storage, files);

    info!(%addr, %data_dir, %files_dir, "tradeflow listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
