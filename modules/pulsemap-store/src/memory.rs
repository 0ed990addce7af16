//! MemoryRecordStore — in-memory store for tests, no database required.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pulsemap_common::{Alert, Report};

use crate::traits::RecordStore;

/// In-memory record store. Thread-safe. Read failure can be injected to
/// exercise error propagation.
#[derive(Default)]
pub struct MemoryRecordStore {
    reports: Mutex<Vec<Report>>,
    alerts: Mutex<Vec<Alert>>,
    fail_reads: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent fetch return an error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// All persisted alerts (for test assertions).
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }

    /// All persisted reports (for test assertions).
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_report(&self, report: &Report) -> Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn fetch_reports_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("injected read failure"));
        }
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.created_at >= since)
            .cloned()
            .collect())
    }

    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<()> {
        self.alerts.lock().unwrap().extend_from_slice(alerts);
        Ok(())
    }

    async fn fetch_alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("injected read failure"));
        }
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.created_at >= since)
            .cloned()
            .collect())
    }

    async fn has_undelivered_alert(&self, cell: &str, rule_id: &str) -> Result<bool> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.cell == cell && a.rule_id == rule_id && !a.delivered))
    }

    async fn mark_alert_delivered(&self, id: Uuid) -> Result<()> {
        let mut alerts = self.alerts.lock().unwrap();
        match alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.delivered = true;
                Ok(())
            }
            None => Err(anyhow!("no alert with id {id}")),
        }
    }
}
