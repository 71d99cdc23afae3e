//! Fan-out orchestrator for the aggregate stats report
//!
//! Issues thirteen independent sub-queries against the stats repo
//! concurrently, joins on all of them, and merges the results into one
//! fixed-shape report. Only the event-data sub-query may fail without
//! failing the request; it falls back to a zeroed summary.

use crate::query::types::{
    DateRange, Dimension, EventDataSummary, MetricRow, QueryFilters, TimePoint, TimeUnit,
};
use crate::query::{StatsRepo, StoreResult};
use crate::report::date_range::resolve_compare_range;
use crate::report::format::{format_comparison, format_session_stats, ComparisonStat, SingleStat};
use crate::report::language::{fold_locales, LanguageOrder};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Validated inputs for one aggregate report. Immutable for the duration of
/// the request.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub website_id: String,
    pub range: DateRange,
    pub unit: Option<TimeUnit>,
    pub timezone: Option<String>,
    pub compare: Option<String>,
    pub limit: i64,
    pub filters: QueryFilters,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeseries {
    pub pageviews: Vec<TimePoint>,
    pub sessions: Vec<TimePoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopMetrics {
    pub urls: Vec<MetricRow>,
    pub referrers: Vec<MetricRow>,
    pub browsers: Vec<MetricRow>,
    pub os: Vec<MetricRow>,
    pub devices: Vec<MetricRow>,
    pub countries: Vec<MetricRow>,
    pub languages: Vec<MetricRow>,
}

/// The terminal response value. Every key is always present regardless of
/// how much underlying data exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub stats: BTreeMap<String, ComparisonStat>,
    pub session_stats: BTreeMap<String, SingleStat>,
    pub timeseries: Timeseries,
    pub top_metrics: TopMetrics,
    pub event_data: EventDataSummary,
}

enum Series {
    Pageviews,
    Sessions,
}

/// Timeseries sub-queries only run when both `unit` and `timezone` were
/// supplied; otherwise they resolve to an empty sequence without touching
/// the repo.
async fn timeseries(
    repo: &dyn StatsRepo,
    request: &ReportRequest,
    series: Series,
) -> StoreResult<Vec<TimePoint>> {
    let (Some(unit), Some(timezone)) = (request.unit, request.timezone.as_deref()) else {
        return Ok(Vec::new());
    };
    match series {
        Series::Pageviews => {
            repo.get_pageview_series(
                &request.website_id,
                &request.filters,
                &request.range,
                unit,
                timezone,
            )
            .await
        }
        Series::Sessions => {
            repo.get_session_series(
                &request.website_id,
                &request.filters,
                &request.range,
                unit,
                timezone,
            )
            .await
        }
    }
}

async fn ranked(
    repo: &dyn StatsRepo,
    request: &ReportRequest,
    dimension: Dimension,
) -> StoreResult<Vec<MetricRow>> {
    repo.get_metric_rows(
        &request.website_id,
        &request.filters,
        &request.range,
        dimension,
        request.limit,
    )
    .await
}

/// Event data is the one sub-query allowed to fail: any error is swallowed
/// into the zeroed summary so the rest of the report still goes out.
async fn event_data_or_default(
    repo: &dyn StatsRepo,
    request: &ReportRequest,
) -> StoreResult<EventDataSummary> {
    Ok(
        match repo
            .get_event_data_summary(&request.website_id, &request.range)
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                warn!(website_id = %request.website_id, "event data query failed: {err}");
                EventDataSummary::default()
            }
        },
    )
}

/// Run the full fan-out and merge. All thirteen sub-queries are dispatched
/// up front and joined as a barrier; any failure outside the event-data
/// query fails the whole request as a single unit.
pub async fn build_aggregate_report(
    repo: &dyn StatsRepo,
    request: &ReportRequest,
    language_order: LanguageOrder,
) -> StoreResult<AggregateReport> {
    let compare_range = resolve_compare_range(&request.range, request.compare.as_deref());

    let (
        current,
        previous,
        session,
        pageview_series,
        session_series,
        urls,
        referrers,
        browsers,
        os,
        devices,
        countries,
        language_rows,
        event_data,
    ) = tokio::try_join!(
        repo.get_aggregate(&request.website_id, &request.filters, &request.range),
        repo.get_aggregate(&request.website_id, &request.filters, &compare_range),
        repo.get_session_aggregate(&request.website_id, &request.filters, &request.range),
        timeseries(repo, request, Series::Pageviews),
        timeseries(repo, request, Series::Sessions),
        ranked(repo, request, Dimension::Url),
        ranked(repo, request, Dimension::Referrer),
        ranked(repo, request, Dimension::Browser),
        ranked(repo, request, Dimension::Os),
        ranked(repo, request, Dimension::Device),
        ranked(repo, request, Dimension::Country),
        ranked(repo, request, Dimension::Language),
        event_data_or_default(repo, request),
    )?;

    let languages = fold_locales(&language_rows, language_order)
        .into_iter()
        .map(|bucket| MetricRow {
            x: bucket.code,
            y: bucket.count,
        })
        .collect();

    Ok(AggregateReport {
        stats: format_comparison(&current, &previous),
        session_stats: format_session_stats(&session),
        timeseries: Timeseries {
            pageviews: pageview_series,
            sessions: session_series,
        },
        top_metrics: TopMetrics {
            urls,
            referrers,
            browsers,
            os,
            devices,
            countries,
            languages,
        },
        event_data,
    })
}
