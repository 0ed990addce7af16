use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Only env-specific values live here; the alert rule table is code
/// (see pulsemap-engine).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,

    /// Seconds between alert engine cycles.
    pub alert_period_secs: u64,
    /// Trailing window the alert engine aggregates over, in hours.
    pub alert_window_hours: f64,
    /// Cell identifier precision the alert engine buckets at.
    pub alert_cell_precision: usize,
    /// Minimum reports a cell must have before any rule is evaluated.
    pub alert_min_cell_reports: u64,
    /// When true, a (cell, rule) pair with an undelivered alert on file
    /// is not re-emitted.
    pub alert_suppress_repeats: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable is required")?,
            alert_period_secs: env_or("ALERT_PERIOD_SECS", 120)?,
            alert_window_hours: env_or("ALERT_WINDOW_HOURS", 2.0)?,
            alert_cell_precision: env_or("ALERT_CELL_PRECISION", 6)?,
            alert_min_cell_reports: env_or("ALERT_MIN_CELL_REPORTS", 15)?,
            alert_suppress_repeats: env_or("ALERT_SUPPRESS_REPEATS", false)?,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
