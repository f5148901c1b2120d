// HTTP surface for a locally hosted analytics profile

pub mod analytics;
pub mod health;

use crate::analytics::AnalyticsService;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn router(service: Arc<AnalyticsService>) -> Router {
    let analytics_routes = Router::new()
        .route("/api/analytics/session", post(analytics::start_session))
        .route("/api/analytics/pageview", post(analytics::track_page_view))
        .route("/api/analytics/event", post(analytics::track_event))
        .route("/api/analytics/metrics", get(analytics::get_metrics))
        .with_state(service);

    Router::new()
        .route("/", get(health::health_check))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::prometheus_metrics))
        .merge(analytics_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
