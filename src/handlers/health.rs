use crate::metrics::METRICS_REGISTRY;
use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

pub async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "portfolio-analytics",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Prometheus text exposition
pub async fn prometheus_metrics() -> (StatusCode, String) {
    match METRICS_REGISTRY.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            tracing::error!("Failed to render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}
