//! Windowed spatial aggregation and alert-rule engine.
//!
//! Groups recent reports into spatial cells, computes per-cell statistics,
//! enforces an anonymity floor, and evaluates independent threshold rules.
//! Two entry points share one bucketing implementation: the on-demand heatmap
//! query (caller-chosen window and precision, no floor) and the periodic
//! alert engine (fixed window, fixed precision, floor enforced).

pub mod aggregate;
pub mod engine;
pub mod queries;
pub mod rules;
pub mod scheduler;

pub use aggregate::bucket_reports;
pub use engine::{AlertEngine, AlertPolicy, CycleStats};
pub use queries::{heatmap, recent_alerts, HeatmapParams};
pub use rules::{default_rules, AlertRule};
pub use scheduler::{AlertScheduler, SchedulerHandle};
