//! pulsemap-alertd — runs the periodic alert engine for the process lifetime.
//!
//! The HTTP layer and ingestion path live elsewhere; this binary only owns
//! migrations and the recurring evaluation cycle.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pulsemap_common::AppConfig;
use pulsemap_engine::{AlertEngine, AlertPolicy, AlertScheduler};
use pulsemap_store::PgRecordStore;

#[derive(Parser)]
#[command(name = "pulsemap-alertd", about = "PulseMap alert engine daemon")]
struct Cli {
    /// Run exactly one evaluation cycle and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting pulsemap-alertd");

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Migrations complete");

    let store = PgRecordStore::new(pool);
    let policy = AlertPolicy {
        window_hours: config.alert_window_hours,
        cell_precision: config.alert_cell_precision,
        min_cell_reports: config.alert_min_cell_reports,
        suppress_repeats: config.alert_suppress_repeats,
    };
    let engine = AlertEngine::new(store, policy);

    if cli.once {
        let stats = engine.run_cycle().await?;
        tracing::info!(%stats, "Single cycle complete");
        return Ok(());
    }

    let period = Duration::from_secs(config.alert_period_secs);
    let handle = AlertScheduler::new(engine, period).start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping scheduler");
    handle.stop().await;

    Ok(())
}
