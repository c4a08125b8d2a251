//! CLI commands for keiba-refund.
//!
//! Supports the API server, the full daily run, and the individual
//! scrape / judge / extract steps for manual runs and debugging.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::judge::MarkMatcher;
use crate::payout::PayoutTable;
use crate::pipeline::{parse_run_date, run_daily};
use crate::race::race_ids_for_date;
use crate::scraper::{HttpFetcher, PayoutScraper, RateLimiter, RefundParser};
use crate::storage::{ArtifactStore, LocalStore};
use crate::workbook::load_prediction_book;

#[derive(Parser)]
#[command(name = "keiba-refund")]
#[command(version, about = "Keiba refund scraper and prediction hit checker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scrape payout tables for a date and write the payout CSV
    Scrape {
        /// Race date (YYYYMMDD or YYYY-MM-DD, default today in JST)
        #[arg(short, long)]
        date: Option<String>,

        /// Venue codes override (e.g. 44,45)
        #[arg(short, long, value_delimiter = ',')]
        venues: Option<Vec<String>>,

        /// Output CSV path (default: the result directory layout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Judge a payout CSV against a prediction workbook
    Judge {
        /// Payout CSV
        #[arg(value_name = "PAYOUTS")]
        payouts: PathBuf,

        /// Prediction workbook (.xlsx)
        #[arg(value_name = "WORKBOOK")]
        workbook: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full daily run: scrape, store, judge every configured predictor
    Run {
        /// Race date (YYYYMMDD or YYYY-MM-DD, default today in JST)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Extract payout rows from a saved result page
    Extract {
        /// Saved HTML file (UTF-8)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Race ID to tag the rows with
        #[arg(short, long)]
        race_id: String,
    },
}

fn build_scraper(config: &AppConfig) -> anyhow::Result<PayoutScraper<HttpFetcher>> {
    let fetcher = HttpFetcher::new(&config.scrape.user_agent, config.scrape.timeout())?;
    Ok(PayoutScraper::new(
        fetcher,
        RateLimiter::from_secs(config.scrape.request_interval_secs),
        config.scrape.base_url.clone(),
    ))
}

fn build_store(config: &AppConfig) -> LocalStore {
    LocalStore::new(&config.output.result_dir, &config.output.prediction_dir)
}

/// Build the shared pieces of a server or daily run.
pub fn build_components(config: &AppConfig) -> anyhow::Result<(PayoutScraper<HttpFetcher>, LocalStore)> {
    Ok((build_scraper(config)?, build_store(config)))
}

pub async fn run_scrape(
    date: Option<String>,
    venues: Option<Vec<String>>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(venues) = venues {
        config.scrape.venue_codes = venues;
    }

    let date = parse_run_date(date.as_deref())?;
    let race_ids = race_ids_for_date(date, &config.scrape.venue_codes, config.scrape.races_per_venue);
    eprintln!("Scraping {} races for {}", race_ids.len(), date);

    let scraper = build_scraper(&config)?;
    let table = scraper.scrape(&race_ids).await;

    let path = match output {
        Some(path) => {
            std::fs::write(&path, table.to_csv()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path
        }
        None => build_store(&config).save_payouts(date, &table)?,
    };

    eprintln!("{} payout rows from {} races -> {}", table.len(), table.race_ids().len(), path.display());
    Ok(())
}

pub fn run_judge(payouts: PathBuf, workbook: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let table = PayoutTable::read_csv(&payouts)?;
    let book = load_prediction_book(&workbook)?;
    eprintln!("{} payout rows, {} sheets", table.len(), book.len());

    let report = MarkMatcher::judge(&table, &book);

    match output {
        Some(path) => {
            std::fs::write(&path, &report).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", report),
    }
    Ok(())
}

pub async fn run_daily_command(date: Option<String>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let date = parse_run_date(date.as_deref())?;
    let (scraper, store) = build_components(&config)?;

    let response = run_daily(&scraper, Arc::new(store), &config, date).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

pub fn run_extract(input: PathBuf, race_id: String) -> anyhow::Result<()> {
    let raw = std::fs::read(&input).with_context(|| format!("Failed to read {}", input.display()))?;
    let html = String::from_utf8_lossy(&raw);

    let table = PayoutTable::from_records(RefundParser::extract(&html, &race_id));
    if table.is_empty() {
        eprintln!("No payout table in {}", input.display());
    }
    print!("{}", table.to_csv()?);
    Ok(())
}
