use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::ReportConfig;
use crate::query::StatsRepo;

use super::handlers::{health_check, record_event, AppState};
use super::stats::get_website_stats;

pub fn create_api_router(repo: Arc<dyn StatsRepo>, report: ReportConfig) -> Router {
    let state = Arc::new(AppState { repo, report });

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/websites/{website_id}/stats", get(get_website_stats))
        .route("/api/websites/{website_id}/events", post(record_event))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
