use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use resale_finder::{calculate_suggestion, config, ResaleFinder, Settings};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Resale price finder
#[derive(Parser)]
#[command(name = "resale-finder")]
#[command(about = "Identify a product, pull comparable listings, and suggest a resale price")]
struct Cli {
    /// DuckDB database file (defaults to RESALE_FINDER_DB, then the user data dir)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Keep records in memory only
    #[arg(long, global = true)]
    in_memory: bool,

    /// Seed for reproducible demo listings
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a price suggestion from raw prices
    Suggest {
        #[arg(allow_negative_numbers = true)]
        prices: Vec<String>,
    },
    /// Look up listings for keywords without saving anything
    Search {
        #[arg(required = true)]
        keywords: Vec<String>,
    },
    /// Identify an image, search for it, and save the results
    Identify {
        image: PathBuf,
    },
    /// Search for keywords and save the results
    Find {
        #[arg(required = true)]
        keywords: Vec<String>,
    },
    /// Show saved results for an image id
    Results {
        id: i64,
    },
    /// Re-run the search for an image id
    Refresh {
        id: i64,
    },
    /// List recent searches
    Recent,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Suggest is pure arithmetic and needs neither the store nor the clients.
    let command = match cli.command {
        Commands::Suggest { prices } => return suggest(&prices),
        other => other,
    };

    let mut settings = Settings::from_env();
    if cli.in_memory {
        settings.database_path = None;
    } else if let Some(path) = cli.database.clone() {
        settings.database_path = Some(path);
    } else if settings.database_path.is_none() {
        settings.database_path = Some(config::default_database_path());
    }

    let mut builder = ResaleFinder::builder().settings(settings);
    if let Some(seed) = cli.seed {
        builder = builder.demo_seed(seed);
    }
    let finder = builder.build().context("failed to open resale finder")?;
    info!("{}", finder);

    match command {
        Commands::Suggest { prices } => suggest(&prices)?,
        Commands::Search { keywords } => {
            print_json(&finder.search(&keywords.join(" "))?)?;
        }
        Commands::Identify { image } => {
            let id = finder.upload_image(&image)?;
            print_json(&finder.results(id)?)?;
        }
        Commands::Find { keywords } => {
            let id = finder.manual_search(&keywords.join(" "))?;
            print_json(&finder.results(id)?)?;
        }
        Commands::Results { id } => {
            print_json(&finder.results(id)?)?;
        }
        Commands::Refresh { id } => {
            finder.refresh_search(id)?;
            print_json(&finder.results(id)?)?;
        }
        Commands::Recent => {
            for image in finder.recent_searches()? {
                println!("{}", image);
            }
        }
    }

    Ok(())
}

fn suggest(prices: &[String]) -> Result<()> {
    let parsed = prices
        .iter()
        .map(|p| Decimal::from_str(p).with_context(|| format!("invalid price: {}", p)))
        .collect::<Result<Vec<_>>>()?;
    print_json(&calculate_suggestion(&parsed))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_accepts_negative_prices() {
        let cli = Cli::try_parse_from(["resale-finder", "suggest", "-5", "10", "-0.50"]).unwrap();
        match cli.command {
            Commands::Suggest { prices } => assert_eq!(prices, vec!["-5", "10", "-0.50"]),
            _ => panic!("expected suggest"),
        }
        assert!(suggest(&["-5".to_string(), "10".to_string()]).is_ok());
    }

    #[test]
    fn suggest_rejects_non_numeric_price() {
        assert!(suggest(&["ten".to_string()]).is_err());
    }

    #[test]
    fn global_flags_still_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["resale-finder", "suggest", "--seed", "7", "3"]).unwrap();
        assert_eq!(cli.seed, Some(7));
    }
}
