//! The alert engine — one aggregation-and-evaluation cycle.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use pulsemap_common::Alert;
use pulsemap_store::RecordStore;

use crate::aggregate::bucket_reports;
use crate::rules::{default_rules, AlertRule};

/// Fixed parameters of the periodic evaluation. Unlike the heatmap query,
/// none of these are caller-chosen.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    /// Trailing aggregation window in hours.
    pub window_hours: f64,
    /// Cell precision reports are bucketed at.
    pub cell_precision: usize,
    /// Anonymity floor: cells with fewer reports are never evaluated, so no
    /// alert can describe a population smaller than this.
    pub min_cell_reports: u64,
    /// When true, skip a (cell, rule) pair that already has an undelivered
    /// alert on file. Off by default: a condition that persists re-fires
    /// every cycle.
    pub suppress_repeats: bool,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            window_hours: 2.0,
            cell_precision: 6,
            min_cell_reports: 15,
            suppress_repeats: false,
        }
    }
}

/// Counters from one cycle, logged by the scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    pub reports: usize,
    pub cells: usize,
    pub floored_cells: usize,
    pub alerts: usize,
}

impl std::fmt::Display for CycleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} reports, {} cells ({} below floor), {} alerts",
            self.reports, self.cells, self.floored_cells, self.alerts
        )
    }
}

/// Periodic evaluator: buckets recent reports at a fixed window and
/// precision, applies the anonymity floor, runs the rule table, and commits
/// all new alerts in one transaction.
///
/// Holds no state across cycles beyond what is in the store.
pub struct AlertEngine<S> {
    store: S,
    policy: AlertPolicy,
    rules: Vec<AlertRule>,
}

impl<S: RecordStore> AlertEngine<S> {
    pub fn new(store: S, policy: AlertPolicy) -> Self {
        Self::with_rules(store, policy, default_rules())
    }

    pub fn with_rules(store: S, policy: AlertPolicy, rules: Vec<AlertRule>) -> Self {
        Self {
            store,
            policy,
            rules,
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleStats> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle against the window ending at `now`.
    ///
    /// Rules are evaluated independently per surviving cell: a cell meeting
    /// several conditions emits one alert per rule. Any failure abandons the
    /// cycle with nothing committed.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleStats> {
        let window = Duration::milliseconds((self.policy.window_hours * 3_600_000.0) as i64);
        let since = now - window;

        let reports = self.store.fetch_reports_since(since).await?;
        let buckets = bucket_reports(&reports, self.policy.cell_precision);

        let mut stats = CycleStats {
            reports: reports.len(),
            cells: buckets.len(),
            ..Default::default()
        };

        let mut alerts = Vec::new();
        for (cell, agg) in &buckets {
            if agg.n < self.policy.min_cell_reports {
                stats.floored_cells += 1;
                continue;
            }

            for rule in &self.rules {
                let Some(payload) = rule.evaluate(agg) else {
                    continue;
                };
                if self.policy.suppress_repeats
                    && self.store.has_undelivered_alert(cell, rule.id).await?
                {
                    continue;
                }
                alerts.push(Alert {
                    id: Uuid::new_v4(),
                    cell: cell.clone(),
                    created_at: now,
                    rule_id: rule.id.to_string(),
                    level: rule.level,
                    payload,
                    delivered: false,
                });
            }
        }

        stats.alerts = alerts.len();
        self.store.insert_alerts(&alerts).await?;

        info!(
            reports = stats.reports,
            cells = stats.cells,
            floored_cells = stats.floored_cells,
            alerts = stats.alerts,
            "Alert cycle complete"
        );
        Ok(stats)
    }
}
