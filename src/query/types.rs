//! Shared types for the stats query layer

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Half-open date window `[start_at, end_at)` over which a sub-query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        Self { start_at, end_at }
    }

    /// Build a range from epoch-millisecond bounds as they arrive on the wire.
    /// Returns `None` when either bound is outside chrono's representable range.
    pub fn from_millis(start_at: i64, end_at: i64) -> Option<Self> {
        let start = Utc.timestamp_millis_opt(start_at).single()?;
        let end = Utc.timestamp_millis_opt(end_at).single()?;
        Some(Self::new(start, end))
    }

    pub fn duration(&self) -> Duration {
        self.end_at - self.start_at
    }

    /// A degenerate range reads no rows.
    pub fn is_empty(&self) -> bool {
        self.start_at >= self.end_at
    }
}

/// Timeseries bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Year,
    Month,
    Day,
    Hour,
}

impl TimeUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "year" => Some(Self::Year),
            "month" => Some(Self::Month),
            "day" => Some(Self::Day),
            "hour" => Some(Self::Hour),
            _ => None,
        }
    }

    /// strftime format that truncates a local timestamp to this unit's bucket.
    pub fn sqlite_format(&self) -> &'static str {
        match self {
            Self::Year => "%Y-01-01 00:00:00",
            Self::Month => "%Y-%m-01 00:00:00",
            Self::Day => "%Y-%m-%d 00:00:00",
            Self::Hour => "%Y-%m-%d %H:00:00",
        }
    }

    /// Argument for Postgres `date_trunc`.
    pub fn pg_unit(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
        }
    }
}

/// Categorical attribute over which visit/view counts are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Url,
    Referrer,
    Browser,
    Os,
    Device,
    Country,
    Language,
}

impl Dimension {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Url => "url_path",
            Self::Referrer => "referrer_domain",
            Self::Browser => "browser",
            Self::Os => "os",
            Self::Device => "device",
            Self::Country => "country",
            Self::Language => "language",
        }
    }

    /// Content dimensions rank by raw views; visitor-profile dimensions rank
    /// by distinct visitors so one chatty session cannot dominate.
    pub fn ranks_by_visitors(&self) -> bool {
        !matches!(self, Self::Url | Self::Referrer)
    }
}

/// Dimensional equality filters applied uniformly to every sub-query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryFilters {
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub title: Option<String>,
    pub query: Option<String>,
    pub host: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub language: Option<String>,
    pub screen: Option<String>,
}

impl QueryFilters {
    /// Present filters as `(column, value)` pairs for WHERE-clause building.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        let pairs: [(&'static str, &Option<String>); 13] = [
            ("url_path", &self.url),
            ("referrer_domain", &self.referrer),
            ("page_title", &self.title),
            ("url_query", &self.query),
            ("hostname", &self.host),
            ("os", &self.os),
            ("browser", &self.browser),
            ("device", &self.device),
            ("country", &self.country),
            ("region", &self.region),
            ("city", &self.city),
            ("language", &self.language),
            ("screen", &self.screen),
        ];
        for (column, value) in pairs {
            if let Some(v) = value {
                out.push((column, v.as_str()));
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// One entry of a ranked dimension result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MetricRow {
    pub x: String,
    pub y: i64,
}

/// One bucket of a timeseries result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TimePoint {
    pub t: String,
    pub y: i64,
}

/// Single-row aggregate result keyed by metric name. Kept dynamic so the
/// formatters iterate whatever fields the store produced; missing or NULL
/// fields coerce to zero downstream rather than erroring.
pub type AggregateRow = serde_json::Map<String, serde_json::Value>;

/// Counts over the event-data table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct EventDataSummary {
    pub events: i64,
    pub properties: i64,
    pub records: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_from_millis() {
        let range = DateRange::from_millis(1_700_000_000_000, 1_700_604_800_000).unwrap();
        assert_eq!(range.duration(), Duration::milliseconds(604_800_000));
        assert!(!range.is_empty());
    }

    #[test]
    fn degenerate_range_is_empty() {
        let range = DateRange::from_millis(1_700_000_000_000, 1_700_000_000_000).unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn filters_map_to_columns() {
        let filters = QueryFilters {
            url: Some("/pricing".to_string()),
            country: Some("DE".to_string()),
            ..Default::default()
        };
        let entries = filters.entries();
        assert_eq!(
            entries,
            vec![("url_path", "/pricing"), ("country", "DE")]
        );
    }

    #[test]
    fn empty_filters() {
        assert!(QueryFilters::default().is_empty());
    }

    #[test]
    fn unknown_unit_rejected() {
        assert_eq!(TimeUnit::parse("week"), None);
        assert_eq!(TimeUnit::parse("hour"), Some(TimeUnit::Hour));
    }
}
