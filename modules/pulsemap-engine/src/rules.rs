//! The alert rule table.
//!
//! Rules are data: each carries an id, a severity level, and a trigger that
//! returns the audit payload when the condition holds. Adding a rule means
//! adding an entry to `default_rules`, not forking the evaluation loop.

use serde_json::json;

use pulsemap_common::CellAggregate;

/// One independent threshold rule. Rules never see each other's results;
/// a single cell can fire several in one pass.
pub struct AlertRule {
    pub id: &'static str,
    pub level: i16,
    trigger: fn(&CellAggregate) -> Option<serde_json::Value>,
}

impl AlertRule {
    pub fn new(
        id: &'static str,
        level: i16,
        trigger: fn(&CellAggregate) -> Option<serde_json::Value>,
    ) -> Self {
        Self { id, level, trigger }
    }

    /// Returns the alert payload when this rule fires for the aggregate.
    pub fn evaluate(&self, agg: &CellAggregate) -> Option<serde_json::Value> {
        (self.trigger)(agg)
    }
}

const NEG_RATIO_MIN: f64 = 0.60;
const HIGH_RISK_MIN: u64 = 5;
const AVG_SENTIMENT_MAX: f64 = -0.35;
const AVG_SENTIMENT_MIN_N: u64 = 30;

/// The production rule set.
///
/// Payload keys match the wire format consumed downstream: `neg_ratio`,
/// `high_risk`, `avg`.
pub fn default_rules() -> Vec<AlertRule> {
    vec![
        AlertRule::new("A", 1, |agg| {
            let neg_ratio = agg.neg_ratio();
            (neg_ratio >= NEG_RATIO_MIN).then(|| json!({ "n": agg.n, "neg_ratio": neg_ratio }))
        }),
        AlertRule::new("B", 2, |agg| {
            (agg.high_risk_count >= HIGH_RISK_MIN)
                .then(|| json!({ "n": agg.n, "high_risk": agg.high_risk_count }))
        }),
        AlertRule::new("C", 1, |agg| {
            let avg = agg.avg_sentiment();
            (avg <= AVG_SENTIMENT_MAX && agg.n >= AVG_SENTIMENT_MIN_N)
                .then(|| json!({ "n": agg.n, "avg": avg }))
        }),
    ]
}
