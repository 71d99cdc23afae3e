//! Integration tests for the stats API endpoints
//!
//! Drives the axum router directly with an in-memory SQLite store behind it.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vantage::api::create_api_router;
use vantage::config::ReportConfig;
use vantage::query::{SqliteStore, StatsRepo};

async fn create_test_router() -> Router {
    // A single pooled connection keeps every query on the same in-memory
    // database.
    let store = SqliteStore::new("sqlite::memory:", 1).await.unwrap();
    store.init().await.unwrap();
    let repo: Arc<dyn StatsRepo> = Arc::new(store);
    create_api_router(repo, ReportConfig::default())
}

fn start_ms() -> i64 {
    Utc.with_ymd_and_hms(2024, 5, 8, 0, 0, 0)
        .unwrap()
        .timestamp_millis()
}

fn end_ms() -> i64 {
    (Utc.with_ymd_and_hms(2024, 5, 8, 0, 0, 0).unwrap() + Duration::days(7)).timestamp_millis()
}

async fn post_event(router: &Router, website_id: &str, payload: Value) -> StatusCode {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/websites/{website_id}/events"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn sample_event(session: &str, at_ms: i64, path: &str, language: &str) -> Value {
    json!({
        "session_id": session,
        "visit_id": format!("{session}-v1"),
        "created_at": at_ms,
        "url_path": path,
        "language": language,
        "browser": "Firefox",
        "country": "DE"
    })
}

#[tokio::test]
async fn health_check_works() {
    let router = create_test_router().await;
    let (status, json) = get_json(&router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "OK");
}

#[tokio::test]
async fn event_ingest_round_trip() {
    let router = create_test_router().await;

    let status = post_event(
        &router,
        "site-1",
        sample_event("sess-a", start_ms() + 1000, "/", "en-US"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let status = post_event(
        &router,
        "site-1",
        sample_event("sess-a", start_ms() + 60_000, "/pricing", "en-US"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!(
        "/api/websites/site-1/stats?start_at={}&end_at={}",
        start_ms(),
        end_ms()
    );
    let (status, json) = get_json(&router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stats"]["pageviews"]["value"].as_f64(), Some(2.0));
    assert_eq!(json["stats"]["visitors"]["value"].as_f64(), Some(1.0));
}

#[tokio::test]
async fn rejects_invalid_event_payload() {
    let router = create_test_router().await;
    let status = post_event(
        &router,
        "site-1",
        json!({"session_id": "", "visit_id": "v1", "url_path": "/"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_response_shape_is_stable_for_empty_data() {
    let router = create_test_router().await;
    let uri = format!(
        "/api/websites/empty-site/stats?start_at={}&end_at={}",
        start_ms(),
        end_ms()
    );
    let (status, json) = get_json(&router, &uri).await;
    assert_eq!(status, StatusCode::OK);

    for key in ["stats", "sessionStats", "timeseries", "topMetrics", "eventData"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    for key in ["urls", "referrers", "browsers", "os", "devices", "countries", "languages"] {
        assert_eq!(json["topMetrics"][key], json!([]), "topMetrics.{key}");
    }
    assert_eq!(json["timeseries"]["pageviews"], json!([]));
    assert_eq!(json["timeseries"]["sessions"], json!([]));
    assert_eq!(json["eventData"], json!({"events": 0, "properties": 0, "records": 0}));
}

#[tokio::test]
async fn timeseries_appear_when_unit_and_timezone_supplied() {
    let router = create_test_router().await;
    post_event(
        &router,
        "site-1",
        sample_event("sess-a", start_ms() + 1000, "/", "en-US"),
    )
    .await;

    let uri = format!(
        "/api/websites/site-1/stats?start_at={}&end_at={}&unit=hour&timezone=UTC",
        start_ms(),
        end_ms()
    );
    let (status, json) = get_json(&router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["timeseries"]["pageviews"],
        json!([{"t": "2024-05-08 00:00:00", "y": 1}])
    );
}

#[tokio::test]
async fn language_filter_and_locale_folding_through_http() {
    let router = create_test_router().await;
    post_event(
        &router,
        "site-1",
        sample_event("sess-a", start_ms() + 1000, "/", "en-US"),
    )
    .await;
    post_event(
        &router,
        "site-1",
        sample_event("sess-b", start_ms() + 2000, "/", "en-GB"),
    )
    .await;
    post_event(
        &router,
        "site-1",
        sample_event("sess-c", start_ms() + 3000, "/", "es-MX"),
    )
    .await;

    let uri = format!(
        "/api/websites/site-1/stats?start_at={}&end_at={}",
        start_ms(),
        end_ms()
    );
    let (_, json) = get_json(&router, &uri).await;
    assert_eq!(
        json["topMetrics"]["languages"],
        json!([{"x": "en", "y": 2}, {"x": "es", "y": 1}])
    );

    // equality filter narrows every sub-query
    let uri = format!(
        "/api/websites/site-1/stats?start_at={}&end_at={}&language=es-MX",
        start_ms(),
        end_ms()
    );
    let (_, json) = get_json(&router, &uri).await;
    assert_eq!(json["stats"]["pageviews"]["value"].as_f64(), Some(1.0));
}

#[tokio::test]
async fn validates_query_parameters() {
    let router = create_test_router().await;

    let uri = format!(
        "/api/websites/site-1/stats?start_at={}&end_at={}",
        end_ms(),
        start_ms()
    );
    let (status, _) = get_json(&router, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/api/websites/site-1/stats?start_at={}&end_at={}&unit=week",
        start_ms(),
        end_ms()
    );
    let (status, _) = get_json(&router, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/api/websites/site-1/stats?start_at={}&end_at={}&unit=hour&timezone=Mars/Olympus",
        start_ms(),
        end_ms()
    );
    let (status, _) = get_json(&router, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn limit_is_clamped_to_the_configured_maximum() {
    let router = create_test_router().await;
    for i in 0..5i64 {
        post_event(
            &router,
            "site-1",
            sample_event(&format!("sess-{i}"), start_ms() + 1000 + i, &format!("/page-{i}"), "en"),
        )
        .await;
    }

    let uri = format!(
        "/api/websites/site-1/stats?start_at={}&end_at={}&limit=3",
        start_ms(),
        end_ms()
    );
    let (_, json) = get_json(&router, &uri).await;
    assert_eq!(json["topMetrics"]["urls"].as_array().unwrap().len(), 3);

    // limits above the configured max fall back to the max rather than 500
    let uri = format!(
        "/api/websites/site-1/stats?start_at={}&end_at={}&limit=100000",
        start_ms(),
        end_ms()
    );
    let (status, json) = get_json(&router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["topMetrics"]["urls"].as_array().unwrap().len(), 5);
}
