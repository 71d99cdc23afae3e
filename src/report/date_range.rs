//! Comparison-window derivation

use crate::query::types::DateRange;
use chrono::Months;

/// Derive the comparison window for a primary range.
///
/// A duration token (e.g. `"7d"`, `"30d"`, `"prev"`) selects the window of
/// the same length as the primary range ending immediately before its start.
/// The named period `"yoy"` shifts the primary window back one year. With no
/// specifier the window is degenerate (`[start_at, start_at)`): the
/// comparison sub-query still runs, reads nothing, and every `prev` defaults
/// to zero downstream.
pub fn resolve_compare_range(primary: &DateRange, compare: Option<&str>) -> DateRange {
    match compare {
        None => DateRange::new(primary.start_at, primary.start_at),
        Some("yoy") => {
            let shift = Months::new(12);
            DateRange::new(
                primary
                    .start_at
                    .checked_sub_months(shift)
                    .unwrap_or(primary.start_at),
                primary
                    .end_at
                    .checked_sub_months(shift)
                    .unwrap_or(primary.end_at),
            )
        }
        Some(_) => DateRange::new(primary.start_at - primary.duration(), primary.start_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, NaiveDateTime, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(at(start), at(end))
    }

    #[test]
    fn no_specifier_gives_degenerate_window() {
        let primary = range("2024-05-08 00:00:00", "2024-05-15 00:00:00");
        let compare = resolve_compare_range(&primary, None);
        assert!(compare.is_empty());
        assert_eq!(compare.start_at, primary.start_at);
    }

    #[test]
    fn duration_token_gives_preceding_window_of_equal_length() {
        let primary = range("2024-05-08 00:00:00", "2024-05-15 00:00:00");
        let compare = resolve_compare_range(&primary, Some("7d"));
        assert_eq!(compare.end_at, primary.start_at);
        assert_eq!(compare.duration(), Duration::days(7));
        assert_eq!(compare.start_at, primary.start_at - Duration::days(7));
    }

    #[test]
    fn window_length_follows_primary_not_the_token() {
        let primary = range("2024-05-12 00:00:00", "2024-05-15 00:00:00");
        let compare = resolve_compare_range(&primary, Some("30d"));
        assert_eq!(compare.duration(), Duration::days(3));
        assert_eq!(compare.end_at, primary.start_at);
    }

    #[test]
    fn yoy_shifts_back_one_year() {
        let primary = range("2024-05-08 00:00:00", "2024-05-15 00:00:00");
        let compare = resolve_compare_range(&primary, Some("yoy"));
        assert_eq!(
            compare,
            range("2023-05-08 00:00:00", "2023-05-15 00:00:00")
        );
    }
}
