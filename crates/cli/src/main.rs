//! Çarşı CLI - Database migrations and bulk import.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table used by the storefront cart
//! carsi migrate storefront
//!
//! # Create the catalog tables
//! carsi migrate admin
//!
//! # Run all database migrations
//! carsi migrate all
//!
//! # Import products from a workbook or an XML feed
//! carsi import xlsx urunler.xlsx
//! carsi import feed https://tedarikci.example.com/urunler.xml --max-rows 1000
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "carsi")]
#[command(author, version, about = "Çarşı CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Bulk import products into the catalog
    Import {
        /// Rows to process before skipping the rest (default: `IMPORT_MAX_ROWS` or 500)
        #[arg(long, global = true)]
        max_rows: Option<usize>,

        #[command(subcommand)]
        source: ImportSource,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the session table
    Storefront,
    /// Run catalog migrations
    Admin,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum ImportSource {
    /// Import from an `.xlsx` / `.xls` workbook
    Xlsx {
        /// Path to the workbook
        file: PathBuf,
    },
    /// Import from an XML product feed
    Feed {
        /// `http(s)` URL of the feed
        url: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "carsi=info,carsi_admin=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::admin().await?;
                commands::migrate::storefront().await?;
            }
        },
        Commands::Import { max_rows, source } => {
            let report = match source {
                ImportSource::Xlsx { file } => commands::import::xlsx(&file, max_rows).await?,
                ImportSource::Feed { url } => commands::import::feed(&url, max_rows).await?,
            };
            commands::import::print_report(&report);
        }
    }
    Ok(())
}
