// Analytics facade exposed to page components
// Every operation absorbs storage failures; callers never see an error

use super::active_sessions::ActiveSessionTracker;
use super::counters::CounterStore;
use super::identity::IdentityManager;
use super::types::{
    AnalyticsConfig, AnalyticsMetrics, TOTAL_PAGE_VIEWS, TOTAL_PROJECT_VIEWS, TOTAL_VISITORS,
    event_key, page_key,
};
use crate::clock::{Clock, SystemClock};
use crate::metrics::{record_storage_failure, record_tracked};
use crate::storage::{KeyValueStore, StorageError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Client-local analytics service
pub struct AnalyticsService {
    identity: IdentityManager,
    counters: CounterStore,
    tracker: ActiveSessionTracker,
    config: AnalyticsConfig,
}

impl AnalyticsService {
    /// Create a service over `store`, reading time from `clock`
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: AnalyticsConfig,
    ) -> Self {
        let timeout = config.session_timeout();
        let counters = CounterStore::new(store.clone());
        let tracker = ActiveSessionTracker::new(store.clone(), clock.clone(), timeout);
        let identity =
            IdentityManager::new(store, clock, counters.clone(), tracker.clone(), timeout);

        Self {
            identity,
            counters,
            tracker,
            config,
        }
    }

    /// Create a service using wall-clock time
    pub fn with_system_clock(store: Arc<dyn KeyValueStore>, config: AnalyticsConfig) -> Self {
        Self::new(store, Arc::new(SystemClock), config)
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Current session id, if a session has been established
    pub fn session_id(&self) -> Option<String> {
        self.identity.session_id()
    }

    pub async fn visitor_id(&self) -> Option<String> {
        self.identity.visitor_id().await
    }

    /// Establish (or resume) the visitor and session
    pub async fn initialize(&self) -> String {
        self.identity.initialize().await
    }

    async fn ensure_session(&self) -> String {
        match self.identity.session_id() {
            Some(session_id) => session_id,
            None => self.identity.initialize().await,
        }
    }

    /// Record a page view
    pub async fn track_page_view(&self, url: &str, title: &str) {
        let session_id = self.ensure_session().await;

        self.counters.increment(TOTAL_PAGE_VIEWS).await;
        self.counters.increment(&page_key(url)).await;

        self.identity.touch().await;
        self.tracker.refresh(&session_id).await;

        record_tracked("page_view");
        debug!("Page view {} ({}) in session {}", url, title, session_id);
    }

    /// Record a custom event
    ///
    /// `data` is accepted for the caller's convenience and only logged.
    pub async fn track_event(&self, event_type: &str, data: Option<&str>) {
        let session_id = self.ensure_session().await;

        if event_type == self.config.project_view_event {
            self.counters.increment(TOTAL_PROJECT_VIEWS).await;
        }
        self.counters.increment(&event_key(event_type)).await;

        self.identity.touch().await;
        self.tracker.refresh(&session_id).await;

        record_tracked("event");
        debug!(
            "Event {} in session {} (data: {})",
            event_type,
            session_id,
            data.unwrap_or("-")
        );
    }

    async fn try_get_metrics(&self) -> Result<AnalyticsMetrics, StorageError> {
        Ok(AnalyticsMetrics {
            total_visitors: self.counters.try_read(TOTAL_VISITORS).await?,
            active_sessions: self.tracker.try_count_active().await?,
            total_project_views: self.counters.try_read(TOTAL_PROJECT_VIEWS).await?,
        })
    }

    /// Read the headline metrics; all zeros if any read fails
    pub async fn get_metrics(&self) -> AnalyticsMetrics {
        match self.try_get_metrics().await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!("Analytics metrics error: {}", e);
                record_storage_failure("get_metrics");
                AnalyticsMetrics::default()
            }
        }
    }

    /// Read any named counter
    pub async fn counter(&self, key: &str) -> u64 {
        self.counters.read(key).await
    }
}
