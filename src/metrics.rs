// Operational metrics for the analytics subsystem
// These describe the service itself, not the visitor counters it keeps

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Arc<MetricsRegistry> = Arc::new(MetricsRegistry::new());
}

pub struct MetricsRegistry {
    pub registry: Registry,

    /// Storage failures swallowed at an analytics boundary
    pub storage_failures_total: IntCounterVec,
    /// Tracked actions by kind
    pub events_tracked_total: IntCounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();

        let storage_failures_total = IntCounterVec::new(
            Opts::new(
                "analytics_storage_failures_total",
                "Storage failures absorbed by the analytics subsystem",
            ),
            &["operation"],
        )
        .unwrap();

        let events_tracked_total = IntCounterVec::new(
            Opts::new(
                "analytics_events_tracked_total",
                "Tracked analytics actions",
            ),
            &["kind"],
        )
        .unwrap();

        registry
            .register(Box::new(storage_failures_total.clone()))
            .unwrap();
        registry
            .register(Box::new(events_tracked_total.clone()))
            .unwrap();

        Self {
            registry,
            storage_failures_total,
            events_tracked_total,
        }
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub fn record_storage_failure(operation: &str) {
    METRICS_REGISTRY
        .storage_failures_total
        .with_label_values(&[operation])
        .inc();
}

pub fn record_tracked(kind: &str) {
    METRICS_REGISTRY
        .events_tracked_total
        .with_label_values(&[kind])
        .inc();
}
