//! On-demand read operations: the heatmap view and the alert list.
//!
//! Malformed parameters are never rejected — non-positive lookbacks fall
//! back to defaults and precision is clamped per cell. Store failures
//! propagate; there are no partial results.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use pulsemap_common::{Alert, CellAggregate};
use pulsemap_store::RecordStore;

use crate::aggregate::bucket_reports;

pub const DEFAULT_HEATMAP_HOURS: f64 = 2.0;
pub const DEFAULT_HEATMAP_PRECISION: usize = 6;
pub const DEFAULT_ALERT_HOURS: f64 = 24.0;

/// Caller-supplied heatmap parameters, both optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeatmapParams {
    pub hours: Option<f64>,
    pub precision: Option<usize>,
}

impl HeatmapParams {
    fn lookback(&self) -> Duration {
        hours_to_duration(self.hours, DEFAULT_HEATMAP_HOURS)
    }

    fn precision(&self) -> usize {
        self.precision.unwrap_or(DEFAULT_HEATMAP_PRECISION)
    }
}

fn hours_to_duration(hours: Option<f64>, default: f64) -> Duration {
    let hours = match hours {
        Some(h) if h > 0.0 => h,
        _ => default,
    };
    Duration::milliseconds((hours * 3_600_000.0) as i64)
}

/// One aggregate per distinct truncated cell among recent reports.
///
/// Small-sample cells are included on purpose: this is an operational view,
/// not a published disclosure, so no anonymity floor applies here.
pub async fn heatmap<S: RecordStore>(
    store: &S,
    params: HeatmapParams,
) -> Result<Vec<CellAggregate>> {
    heatmap_at(store, params, Utc::now()).await
}

pub async fn heatmap_at<S: RecordStore>(
    store: &S,
    params: HeatmapParams,
    now: DateTime<Utc>,
) -> Result<Vec<CellAggregate>> {
    let since = now - params.lookback();
    let reports = store.fetch_reports_since(since).await?;
    let buckets = bucket_reports(&reports, params.precision());
    Ok(buckets.into_values().collect())
}

/// Alerts emitted within the lookback window, unaggregated.
pub async fn recent_alerts<S: RecordStore>(store: &S, hours: Option<f64>) -> Result<Vec<Alert>> {
    recent_alerts_at(store, hours, Utc::now()).await
}

pub async fn recent_alerts_at<S: RecordStore>(
    store: &S,
    hours: Option<f64>,
    now: DateTime<Utc>,
) -> Result<Vec<Alert>> {
    let since = now - hours_to_duration(hours, DEFAULT_ALERT_HOURS);
    store.fetch_alerts_since(since).await
}
