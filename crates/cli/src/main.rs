//! Merlion Gifts CLI - backend health checks and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Verify the backend is reachable and the catalog responds
//! mg-cli check
//!
//! # Seed the sample catalog through the admin API
//! mg-cli seed
//! ```
//!
//! # Commands
//!
//! - `check` - Probe the backend's public catalog endpoints
//! - `seed` - Create the sample catalog (idempotent, safe to re-run)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mg-cli")]
#[command(author, version, about = "Merlion Gifts CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe backend reachability and catalog sanity
    Check,
    /// Seed sample categories, products, landmarks and coupons
    Seed,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Check => commands::check::run().await?,
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}
