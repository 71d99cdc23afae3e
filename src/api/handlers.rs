use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::ReportConfig;
use crate::models::{EventKind, WebsiteEvent};
use crate::query::StatsRepo;

pub struct AppState {
    pub repo: Arc<dyn StatsRepo>,
    pub report: ReportConfig,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Incoming tracked event. `website_id` comes from the path; a missing
/// timestamp means "now".
#[derive(Debug, Deserialize)]
pub struct EventPayload {
    pub session_id: String,
    pub visit_id: String,
    /// Epoch milliseconds
    pub created_at: Option<i64>,
    #[serde(default)]
    pub kind: EventKind,
    pub event_name: Option<String>,
    pub url_path: String,
    pub url_query: Option<String>,
    pub page_title: Option<String>,
    pub hostname: Option<String>,
    pub referrer_domain: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub language: Option<String>,
    pub screen: Option<String>,
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Record one event for a website
pub async fn record_event(
    State(state): State<Arc<AppState>>,
    Path(website_id): Path<String>,
    Json(payload): Json<EventPayload>,
) -> Result<(StatusCode, Json<SuccessResponse>), (StatusCode, Json<ErrorResponse>)> {
    if payload.session_id.is_empty() || payload.visit_id.is_empty() {
        return Err(bad_request("session_id and visit_id must not be empty"));
    }
    if payload.url_path.is_empty() {
        return Err(bad_request("url_path must not be empty"));
    }

    let created_at = match payload.created_at {
        Some(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| bad_request("created_at is out of range"))?,
        None => Utc::now(),
    };

    let event = WebsiteEvent {
        website_id,
        session_id: payload.session_id,
        visit_id: payload.visit_id,
        created_at,
        kind: payload.kind,
        event_name: payload.event_name,
        url_path: payload.url_path,
        url_query: payload.url_query,
        page_title: payload.page_title,
        hostname: payload.hostname,
        referrer_domain: payload.referrer_domain,
        browser: payload.browser,
        os: payload.os,
        device: payload.device,
        country: payload.country,
        region: payload.region,
        city: payload.city,
        language: payload.language,
        screen: payload.screen,
        data: payload.data,
    };

    match state.repo.insert_event(&event).await {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(SuccessResponse {
                message: "Event recorded".to_string(),
            }),
        )),
        Err(e) => {
            tracing::error!("Failed to record event: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to record event".to_string(),
                }),
            ))
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
