// Analytics endpoints
// Tracking is fire-and-forget: these handlers always accept the request

use crate::analytics::{AnalyticsMetrics, AnalyticsService};
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PageViewRequest {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub event_type: String,
    pub data: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
}

/// POST /api/analytics/session
pub async fn start_session(
    State(service): State<Arc<AnalyticsService>>,
) -> (StatusCode, Json<SessionResponse>) {
    let session_id = service.initialize().await;
    (StatusCode::OK, Json(SessionResponse { session_id }))
}

/// POST /api/analytics/pageview
pub async fn track_page_view(
    State(service): State<Arc<AnalyticsService>>,
    Json(request): Json<PageViewRequest>,
) -> StatusCode {
    service.track_page_view(&request.url, &request.title).await;
    StatusCode::ACCEPTED
}

/// POST /api/analytics/event
pub async fn track_event(
    State(service): State<Arc<AnalyticsService>>,
    Json(request): Json<EventRequest>,
) -> StatusCode {
    service
        .track_event(&request.event_type, request.data.as_deref())
        .await;
    StatusCode::ACCEPTED
}

/// GET /api/analytics/metrics
pub async fn get_metrics(
    State(service): State<Arc<AnalyticsService>>,
) -> Json<AnalyticsMetrics> {
    Json(service.get_metrics().await)
}
