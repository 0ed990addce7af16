//! The storage trait consumed by the aggregation core.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pulsemap_common::{Alert, Report};

/// Persistence for reports and alerts.
///
/// Implemented by `PgRecordStore` (postgres) and `MemoryRecordStore` (tests).
/// Also implemented for `Arc<S>` so tests can share the store for assertions.
///
/// No ordering is guaranteed on fetches; callers bucket or filter themselves.
/// Each method is one transactional unit — nothing here spans a transaction
/// across calls, so a full aggregation cycle runs against whatever concurrent
/// writers commit in between.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist one report. Used by the ingestion path, not by the
    /// aggregation core itself.
    async fn insert_report(&self, report: &Report) -> Result<()>;

    /// All reports with `created_at >= since`.
    async fn fetch_reports_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>>;

    /// Persist a batch of alerts in a single transaction — one commit per
    /// alert engine cycle. A failure commits nothing.
    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<()>;

    /// All alerts with `created_at >= since`.
    async fn fetch_alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>>;

    /// Whether an undelivered alert already exists for this cell and rule.
    /// Only consulted when repeat suppression is enabled.
    async fn has_undelivered_alert(&self, cell: &str, rule_id: &str) -> Result<bool>;

    /// Flip the delivered flag. Called by the downstream notifier.
    async fn mark_alert_delivered(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn insert_report(&self, report: &Report) -> Result<()> {
        (**self).insert_report(report).await
    }

    async fn fetch_reports_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>> {
        (**self).fetch_reports_since(since).await
    }

    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<()> {
        (**self).insert_alerts(alerts).await
    }

    async fn fetch_alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>> {
        (**self).fetch_alerts_since(since).await
    }

    async fn has_undelivered_alert(&self, cell: &str, rule_id: &str) -> Result<bool> {
        (**self).has_undelivered_alert(cell, rule_id).await
    }

    async fn mark_alert_delivered(&self, id: Uuid) -> Result<()> {
        (**self).mark_alert_delivered(id).await
    }
}
