use clap::{Parser, Subcommand};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::io::{self, Write};

const TOKEN_FILE: &str = ".tradeflow_token";

#[derive(Parser)]
#[command(name = "tradeflow-cli")]
#[command(about = "CLI for TradeFlow", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "http://localhost:11111")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    ResetPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Submit a strategy for review.
    Submit {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        /// Comma-separated indicator names, e.g. "RSI, MACD".
        #[arg(short, long)]
        indicators: String,
        /// Optional screenshot as an inline data URL.
        #[arg(short, long)]
        screenshot: Option<String>,
    },
    /// List your own submissions.
    MyScripts,
    /// Admin: list submissions, optionally filtered and sorted.
    Scripts {
        #[arg(short, long, default_value = "all")]
        filter: String,
        #[arg(short, long, default_value = "desc")]
        sort: String,
    },
    /// Admin: mark a submission completed.
    Approve {
        #[arg(short, long)]
        id: String,
    },
    /// Admin: reject a submission. This deletes it permanently.
    Reject {
        #[arg(short, long)]
        id: String,
        /// Skip the interactive confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Admin: attach the Pine-script deliverable (completes the script).
    SavePine {
        #[arg(short, long)]
        id: String,
        /// File holding the Pine-script source.
        #[arg(short, long)]
        file: std::path::PathBuf,
    },
    /// Admin: dashboard counters.
    Dashboard,
    /// Admin: create a catalog product.
    AddProduct {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "")]
        price: String,
        #[arg(long, default_value = "")]
        original_price: String,
        #[arg(long, default_value = "")]
        discount: String,
        #[arg(long, default_value = "")]
        rating: String,
        #[arg(long, default_value = "")]
        reviews: String,
        /// Comma-separated platform names, e.g. "TradingView, MT4".
        #[arg(long, default_value = "")]
        compatibility: String,
        /// One feature line per \n.
        #[arg(long, default_value = "")]
        detailed_description: String,
        #[arg(long)]
        media_url: Option<String>,
        #[arg(long)]
        doc_url: Option<String>,
    },
    ListProducts,
    DeleteProduct {
        #[arg(short, long)]
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Admin: upload a media or document file, printing its reference.
    Upload {
        #[arg(short, long, default_value = "products")]
        category: String,
        /// "media" or "docs".
        #[arg(short, long, default_value = "media")]
        kind: String,
        #[arg(short, long)]
        file: std::path::PathBuf,
    },
    Logout,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn token() -> String {
    fs::read_to_string(TOKEN_FILE).unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Register { email, password } => {
            let res = client
                .post(format!("{}/register", cli.url))
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Login { email, password } => {
            let res = client
                .post(format!("{}/login", cli.url))
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await?;
            if res.status().is_success() {
                let body: LoginResponse = res.json().await?;
                fs::write(TOKEN_FILE, body.token)?;
                println!("Logged in. Token saved to {TOKEN_FILE}");
            } else {
                println!("Login failed: {}", res.text().await?);
            }
        }
        Commands::ResetPassword { email } => {
            let res = client
                .post(format!("{}/reset-password", cli.url))
                .json(&json!({ "email": email }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Submit {
            title,
            description,
            indicators,
            screenshot,
        } => {
            let res = client
                .post(format!("{}/scripts", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .json(&json!({
                    "title": title,
                    "description": description,
                    "indicators": indicators,
                    "screenshot": screenshot,
                }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::MyScripts => {
            let res = client
                .get(format!("{}/my/scripts", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Scripts { filter, sort } => {
            let res = client
                .get(format!(
                    "{}/admin/scripts?filter={}&sort={}",
                    cli.url, filter, sort
                ))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Approve { id } => {
            let res = client
                .post(format!("{}/admin/scripts/{}/approve", cli.url, id))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Reject { id, yes } => {
            if !yes && !confirm("Delete this script? This cannot be undone.") {
                println!("Aborted.");
                return Ok(());
            }
            let res = client
                .delete(format!("{}/admin/scripts/{}", cli.url, id))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::SavePine { id, file } => {
            let content = fs::read_to_string(&file)?;
            let res = client
                .put(format!("{}/admin/scripts/{}/deliverable", cli.url, id))
                .header("Authorization", format!("Bearer {}", token()))
                .json(&json!({ "content": content }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Dashboard => {
            let res = client
                .get(format!("{}/admin/dashboard", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::AddProduct {
            title,
            description,
            price,
            original_price,
            discount,
            rating,
            reviews,
            compatibility,
            detailed_description,
            media_url,
            doc_url,
        } => {
            let res = client
                .post(format!("{}/admin/products", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .json(&json!({
                    "title": title,
                    "description": description,
                    "price": price,
                    "originalPrice": original_price,
                    "discount": discount,
                    "rating": rating,
                    "reviews": reviews,
                    "compatibility": compatibility,
                    "detailedDescription": detailed_description,
                    "mediaUrl": media_url,
                    "docUrl": doc_url,
                }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::ListProducts => {
            let res = client
                .get(format!("{}/admin/products", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::DeleteProduct { id, yes } => {
            if !yes && !confirm("Delete this product?") {
                println!("Aborted.");
                return Ok(());
            }
            let res = client
                .delete(format!("{}/admin/products/{}", cli.url, id))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Upload {
            category,
            kind,
            file,
        } => {
            let bytes = fs::read(&file)?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload.bin".to_string());
            let res = client
                .post(format!(
                    "{}/admin/uploads/{}/{}?filename={}",
                    cli.url, category, kind, filename
                ))
                .header("Authorization", format!("Bearer {}", token()))
                .body(bytes)
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
        }
    }

    Ok(())
}
