// Analytics keys, configuration and read-out types

use chrono::Duration;
use serde::{Deserialize, Serialize};

pub const VISITOR_ID_KEY: &str = "visitorId";
pub const SESSION_ID_KEY: &str = "sessionId";
pub const LAST_ACTIVITY_KEY: &str = "lastActivity";
pub const ACTIVE_SESSIONS_KEY: &str = "activeSessions";

pub const TOTAL_VISITORS: &str = "totalVisitors";
pub const TOTAL_SESSIONS: &str = "totalSessions";
pub const TOTAL_PAGE_VIEWS: &str = "totalPageViews";
pub const TOTAL_PROJECT_VIEWS: &str = "totalProjectViews";

/// Analytics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Inactivity after which a session expires
    pub session_timeout_secs: i64,
    /// Event type that also counts towards `totalProjectViews`
    pub project_view_event: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: 1800, // 30 minutes
            project_view_event: "project_view".to_string(),
        }
    }
}

impl AnalyticsConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::seconds(self.session_timeout_secs)
    }
}

/// Aggregated read-out
///
/// All-zero means "unknown", not "no traffic".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsMetrics {
    pub total_visitors: u64,
    pub active_sessions: u64,
    pub total_project_views: u64,
}

/// Make an identifier safe to embed in a storage key
pub fn normalize_key_segment(raw: &str) -> String {
    raw.replace(['/', '?'], "_")
}

/// Per-page view counter key
pub fn page_key(url: &str) -> String {
    format!("page_{}", normalize_key_segment(url))
}

/// Per-event-type counter key
pub fn event_key(event_type: &str) -> String {
    format!("event_{}", normalize_key_segment(event_type))
}
