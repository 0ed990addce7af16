use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Enums ---

/// Emotion label assigned upstream by the NLU pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Emotion::Positive => write!(f, "positive"),
            Emotion::Neutral => write!(f, "neutral"),
            Emotion::Negative => write!(f, "negative"),
        }
    }
}

impl FromStr for Emotion {
    type Err = crate::PulseMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Emotion::Positive),
            "neutral" => Ok(Emotion::Neutral),
            "negative" => Ok(Emotion::Negative),
            other => Err(crate::PulseMapError::Validation(format!(
                "unknown emotion label: {other}"
            ))),
        }
    }
}

// --- Reports ---

/// A single community report, immutable once ingested.
///
/// All analysis fields (emotion, scores, topics, risk) are computed upstream
/// by the NLU pipeline; the cell identifier comes from the spatial encoder.
/// This crate only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Spatial cell identifier at full precision. None when the report
    /// could not be located.
    pub cell: Option<String>,
    pub emotion: Emotion,
    /// Signed sentiment in roughly [-1, 1].
    pub sentiment_score: f64,
    /// Severity signal, 0 = none. Reports at 2+ count as high-risk.
    pub risk_level: i32,
    /// Top-ranked topic labels, at most 3.
    pub topics: Vec<String>,
    /// Toxicity in [0, 1].
    pub toxicity_score: f64,
}

/// Risk level at or above which a report counts toward a cell's
/// high-risk tally.
pub const HIGH_RISK_THRESHOLD: i32 = 2;

// --- Aggregates ---

/// Per-cell rollup of reports inside one aggregation window.
///
/// Derived in memory on every computation; never persisted. The
/// `cell_aggregates` table exists as a seam for precomputed rollups but
/// nothing writes to it yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellAggregate {
    pub cell: String,
    pub n: u64,
    pub sentiment_sum: f64,
    pub negative_count: u64,
    pub high_risk_count: u64,
}

impl CellAggregate {
    pub fn new(cell: String) -> Self {
        Self {
            cell,
            n: 0,
            sentiment_sum: 0.0,
            negative_count: 0,
            high_risk_count: 0,
        }
    }

    /// Fold one report into this aggregate.
    pub fn accumulate(&mut self, report: &Report) {
        self.n += 1;
        self.sentiment_sum += report.sentiment_score;
        if report.emotion == Emotion::Negative {
            self.negative_count += 1;
        }
        if report.risk_level >= HIGH_RISK_THRESHOLD {
            self.high_risk_count += 1;
        }
    }

    /// Mean sentiment across the window. An aggregate only exists once at
    /// least one report contributed, so n >= 1 here.
    pub fn avg_sentiment(&self) -> f64 {
        self.sentiment_sum / self.n.max(1) as f64
    }

    /// Fraction of reports labelled negative.
    pub fn neg_ratio(&self) -> f64 {
        self.negative_count as f64 / self.n.max(1) as f64
    }
}

// --- Alerts ---

/// A threshold-rule firing for one cell, immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    /// Cell at the engine's fixed precision, independent of any heatmap
    /// query precision.
    pub cell: String,
    pub created_at: DateTime<Utc>,
    pub rule_id: String,
    pub level: i16,
    /// Rule-specific supporting numbers (counts, ratios, averages) kept
    /// for auditability.
    pub payload: serde_json::Value,
    /// Set by the downstream notifier, never by the engine.
    pub delivered: bool,
}
