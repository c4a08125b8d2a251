//! Keiba refund checker
//!
//! Scrapes race payout tables and checks predictors' marks against them,
//! as a REST API and CLI.

mod bet_type;
mod cli;
mod config;
mod judge;
mod marks;
mod payout;
mod pipeline;
mod race;
mod routes;
mod scraper;
mod storage;
mod types;
mod workbook;

use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging (stderr keeps stdout clean for reports and JSON)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keiba_refund=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Serve { host, port } => run_server(host, port).await,
        Commands::Scrape {
            date,
            venues,
            output,
        } => cli::run_scrape(date, venues, output).await,
        Commands::Judge {
            payouts,
            workbook,
            output,
        } => cli::run_judge(payouts, workbook, output),
        Commands::Run { date } => cli::run_daily_command(date).await,
        Commands::Extract { input, race_id } => cli::run_extract(input, race_id),
    }
}

/// Run the API server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!(
        "Venues: {:?}, results: {}, predictions: {}",
        config.scrape.venue_codes,
        config.output.result_dir,
        config.output.prediction_dir
    );

    let (scraper, store) = cli::build_components(&config)?;

    // Create application state
    let state = Arc::new(AppState {
        config: config.clone(),
        scraper,
        store: Arc::new(store),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/run", get(routes::run))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
