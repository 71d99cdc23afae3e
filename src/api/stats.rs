//! Aggregate stats API handler

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::handlers::{bad_request, AppState, ErrorResponse};
use crate::query::types::{DateRange, QueryFilters, TimeUnit};
use crate::report::{build_aggregate_report, AggregateReport, ReportRequest};

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    /// Start of the primary window (epoch milliseconds)
    pub start_at: i64,

    /// End of the primary window (epoch milliseconds, exclusive)
    pub end_at: i64,

    /// Timeseries granularity; timeseries are only produced when both
    /// `unit` and `timezone` are present
    pub unit: Option<String>,

    /// IANA timezone name for timeseries bucketing
    pub timezone: Option<String>,

    /// Comparison specifier (duration token or `yoy`)
    pub compare: Option<String>,

    /// Ranked-list size (default from config, clamped to the max)
    pub limit: Option<i64>,

    // Dimensional filters, each a string equality filter pushed into every
    // sub-query.
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

impl StatsParams {
    fn filters(&self) -> QueryFilters {
        QueryFilters {
            url: self.url.clone(),
            referrer: self.referrer.clone(),
            title: self.title.clone(),
            query: self.query.clone(),
            host: self.host.clone(),
            os: self.os.clone(),
            browser: self.browser.clone(),
            device: self.device.clone(),
            country: self.country.clone(),
            region: self.region.clone(),
            city: self.city.clone(),
            language: self.language.clone(),
            screen: self.screen.clone(),
        }
    }
}

/// Get the aggregate stats report for a website
pub async fn get_website_stats(
    State(state): State<Arc<AppState>>,
    Path(website_id): Path<String>,
    Query(params): Query<StatsParams>,
) -> Result<Json<AggregateReport>, (StatusCode, Json<ErrorResponse>)> {
    if params.start_at >= params.end_at {
        return Err(bad_request("start_at must be before end_at"));
    }
    let range = DateRange::from_millis(params.start_at, params.end_at)
        .ok_or_else(|| bad_request("start_at/end_at are out of range"))?;

    let unit = match params.unit.as_deref() {
        Some(u) => Some(
            TimeUnit::parse(u)
                .ok_or_else(|| bad_request("unit must be one of: year, month, day, hour"))?,
        ),
        None => None,
    };

    if let Some(tz) = params.timezone.as_deref() {
        if tz.parse::<chrono_tz::Tz>().is_err() {
            return Err(bad_request(format!("unknown timezone: {tz}")));
        }
    }

    let limit = params
        .limit
        .unwrap_or(state.report.default_limit)
        .min(state.report.max_limit)
        .max(0);

    let request = ReportRequest {
        website_id,
        range,
        unit,
        timezone: params.timezone.clone(),
        compare: params.compare.clone(),
        limit,
        filters: params.filters(),
    };

    match build_aggregate_report(state.repo.as_ref(), &request, state.report.language_order).await
    {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            tracing::error!("Failed to build aggregate report: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to build aggregate report".to_string(),
                }),
            ))
        }
    }
}
