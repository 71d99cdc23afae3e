//! Tracked event model shared by the ingest path and the stores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of tracked event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A page view
    Pageview,
    /// A named custom event
    Event,
}

impl Default for EventKind {
    fn default() -> Self {
        Self::Pageview
    }
}

impl EventKind {
    /// Discriminant stored in the `event_type` column.
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Pageview => 1,
            Self::Event => 2,
        }
    }
}

/// One tracked event as written to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteEvent {
    /// Website the event belongs to
    pub website_id: String,

    /// Visitor session identifier
    pub session_id: String,

    /// Visit identifier (one session may span several visits)
    pub visit_id: String,

    /// Event timestamp
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub kind: EventKind,

    /// Name of the custom event, when `kind` is `Event`
    pub event_name: Option<String>,

    /// Path component of the visited URL
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

    /// Arbitrary event-data properties attached to the event
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}
