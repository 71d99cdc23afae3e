use crate::models::WebsiteEvent;
use crate::query::types::{
    AggregateRow, DateRange, Dimension, EventDataSummary, MetricRow, QueryFilters, TimePoint,
    TimeUnit,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Data accessor consumed by the aggregation orchestrator. Each method is an
/// independent read; callers get no snapshot-consistency guarantee across
/// calls.
#[async_trait]
pub trait StatsRepo: Send + Sync {
    /// Initialize the store (create tables and indexes).
    async fn init(&self) -> StoreResult<()>;

    /// Insert one tracked event plus its event-data properties.
    async fn insert_event(&self, event: &WebsiteEvent) -> StoreResult<()>;

    /// Site-level aggregate for one window: pageviews, visitors, visits,
    /// bounces, totaltime. Sums over an empty window come back NULL.
    async fn get_aggregate(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
    ) -> StoreResult<AggregateRow>;

    /// Session-level aggregate: pageviews, visitors, visits, countries,
    /// events.
    async fn get_session_aggregate(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
    ) -> StoreResult<AggregateRow>;

    /// Ranked counts for one dimension, descending, truncated to `limit`.
    async fn get_metric_rows(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
        dimension: Dimension,
        limit: i64,
    ) -> StoreResult<Vec<MetricRow>>;

    /// Pageviews bucketed by `unit` in the given IANA timezone.
    async fn get_pageview_series(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
        unit: TimeUnit,
        timezone: &str,
    ) -> StoreResult<Vec<TimePoint>>;

    /// Distinct sessions bucketed by `unit` in the given IANA timezone.
    async fn get_session_series(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
        unit: TimeUnit,
        timezone: &str,
    ) -> StoreResult<Vec<TimePoint>>;

    /// Event-data counts: distinct events, distinct property keys, total
    /// records.
    async fn get_event_data_summary(
        &self,
        website_id: &str,
        range: &DateRange,
    ) -> StoreResult<EventDataSummary>;
}
