//! PgRecordStore — report/alert persistence backed by Postgres.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use pulsemap_common::{Alert, Emotion, Report};

use crate::traits::RecordStore;

type ReportRow = (
    Uuid,
    DateTime<Utc>,
    Option<String>,
    String,
    f64,
    i32,
    Vec<String>,
    f64,
);

type AlertRow = (Uuid, String, DateTime<Utc>, String, i16, serde_json::Value, bool);

/// Postgres-backed record store. Cheap to clone; shares the pool.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn report_from_row(row: ReportRow) -> Result<Report> {
        let (id, created_at, cell, emotion, sentiment_score, risk_level, topics, toxicity_score) =
            row;
        let emotion: Emotion = emotion.parse()?;
        Ok(Report {
            id,
            created_at,
            cell,
            emotion,
            sentiment_score,
            risk_level,
            topics,
            toxicity_score,
        })
    }
}

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    async fn insert_report(&self, report: &Report) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reports (id, created_at, cell, emotion, sentiment_score, risk_level, topics, toxicity_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(report.id)
        .bind(report.created_at)
        .bind(&report.cell)
        .bind(report.emotion.to_string())
        .bind(report.sentiment_score)
        .bind(report.risk_level)
        .bind(&report.topics)
        .bind(report.toxicity_score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_reports_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT id, created_at, cell, emotion, sentiment_score, risk_level, topics, toxicity_score
            FROM reports
            WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::report_from_row).collect()
    }

    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for alert in alerts {
            sqlx::query(
                r#"
                INSERT INTO alerts (id, cell, created_at, rule_id, level, payload, delivered)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(alert.id)
            .bind(&alert.cell)
            .bind(alert.created_at)
            .bind(&alert.rule_id)
            .bind(alert.level)
            .bind(&alert.payload)
            .bind(alert.delivered)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT id, cell, created_at, rule_id, level, payload, delivered
            FROM alerts
            WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, cell, created_at, rule_id, level, payload, delivered)| Alert {
                    id,
                    cell,
                    created_at,
                    rule_id,
                    level,
                    payload,
                    delivered,
                },
            )
            .collect())
    }

    async fn has_undelivered_alert(&self, cell: &str, rule_id: &str) -> Result<bool> {
        let row = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM alerts
                WHERE cell = $1 AND rule_id = $2 AND delivered = FALSE
            )
            "#,
        )
        .bind(cell)
        .bind(rule_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn mark_alert_delivered(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE alerts SET delivered = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
