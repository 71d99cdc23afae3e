//! Pure formatters over single-row aggregate results

use crate::query::types::AggregateRow;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Period-over-period value for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonStat {
    pub value: f64,
    pub prev: f64,
}

/// Single-window value for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SingleStat {
    pub value: f64,
}

/// Missing, NULL, or non-numeric fields all read as zero.
fn coerce(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

/// Pair up the primary and comparison aggregate rows. Iterates the primary
/// row's field set only; fields present solely in the comparison row are
/// ignored.
pub fn format_comparison(
    current: &AggregateRow,
    previous: &AggregateRow,
) -> BTreeMap<String, ComparisonStat> {
    current
        .iter()
        .map(|(key, value)| {
            (
                key.clone(),
                ComparisonStat {
                    value: coerce(Some(value)),
                    prev: coerce(previous.get(key)),
                },
            )
        })
        .collect()
}

/// Format a single aggregate row with no comparison.
pub fn format_session_stats(row: &AggregateRow) -> BTreeMap<String, SingleStat> {
    row.iter()
        .map(|(key, value)| (key.clone(), SingleStat { value: coerce(Some(value)) }))
        .collect()
}
