use anyhow::{Context, Result};
use axum::http::HeaderMap;
use clap::{Parser, Subcommand};
use shorturl::analytics::StatsAggregator;
use shorturl::config::Config;
use shorturl::models::ShortenRequest;
use shorturl::shortener::ShortenService;
use shorturl::storage;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "shorturl-admin")]
#[command(about = "Short URL service management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Create a short link
    Shorten {
        /// URL to shorten; `https://` is assumed when no scheme is given
        url: String,
        /// Custom short code (1-16 letters or digits)
        #[arg(long)]
        code: Option<String>,
    },
    /// Print the analytics report of a short code as JSON
    Stats {
        code: String,
    },
    /// Print the most recent clicks of a short code as JSON
    Clicks {
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage = storage::connect(&config.database).await?;

    // Ensure database is initialized
    storage.init().await?;

    match cli.command {
        Commands::Init => {
            println!("✓ Database schema is ready ({})", config.database.url);
        }
        Commands::Shorten { url, code } => {
            let shortener = ShortenService::new(
                Arc::clone(&storage),
                config.site.base_url.clone(),
                config.shortener.max_attempts,
            );
            let created = shortener
                .shorten(
                    ShortenRequest {
                        url,
                        custom_code: code,
                    },
                    &HeaderMap::new(),
                )
                .await
                .context("failed to create short link")?;
            println!("✓ {} -> {}", created.short_url, created.original_url);
        }
        Commands::Stats { code } => {
            let stats = StatsAggregator::new(storage, config.site.domain.clone());
            let report = stats
                .report(&code)
                .await
                .with_context(|| format!("failed to load stats for '{code}'"))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Clicks { code } => {
            let stats = StatsAggregator::new(storage, config.site.domain.clone());
            let clicks = stats
                .click_list(&code)
                .await
                .with_context(|| format!("failed to load clicks for '{code}'"))?;
            println!("{}", serde_json::to_string_pretty(&clicks)?);
        }
    }

    Ok(())
}
