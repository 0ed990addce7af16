//! Cell bucketing — the single shared aggregation routine.

use std::collections::HashMap;

use pulsemap_common::{CellAggregate, Report};

/// Truncate a cell identifier to `precision` characters, clamped to
/// [1, identifier length]. Requesting more precision than the identifier
/// carries yields the identifier itself, never an error.
pub fn truncate_cell(cell: &str, precision: usize) -> String {
    cell.chars().take(precision.max(1)).collect()
}

/// Group reports into cell aggregates at the given precision.
///
/// Reports with no cell identifier are skipped. Every emitted aggregate has
/// n >= 1 — a key only exists because at least one report produced it.
pub fn bucket_reports<'a>(
    reports: impl IntoIterator<Item = &'a Report>,
    precision: usize,
) -> HashMap<String, CellAggregate> {
    let mut buckets: HashMap<String, CellAggregate> = HashMap::new();

    for report in reports {
        let Some(cell) = report.cell.as_deref() else {
            continue;
        };
        if cell.is_empty() {
            continue;
        }

        let key = truncate_cell(cell, precision);
        buckets
            .entry(key.clone())
            .or_insert_with(|| CellAggregate::new(key))
            .accumulate(report);
    }

    buckets
}
