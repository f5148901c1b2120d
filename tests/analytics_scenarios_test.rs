use async_trait::async_trait;
use chrono::Duration;
use portfolio_analytics::analytics::{ActiveSessionTracker, AnalyticsService, CounterStore};
use portfolio_analytics::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
use portfolio_analytics::{AnalyticsConfig, AnalyticsMetrics, ManualClock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Store that can be switched into a total outage
struct FlakyStore {
    inner: MemoryStore,
    down: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            down: AtomicBool::new(false),
        }
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.down.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        self.inner.get_raw(key).await
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.check()?;
        self.inner.set_raw(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check()?;
        self.inner.keys().await
    }
}

fn service_with(store: Arc<dyn KeyValueStore>, clock: Arc<ManualClock>) -> AnalyticsService {
    AnalyticsService::new(store, clock, AnalyticsConfig::default())
}

/// Fresh store through initialize, page view, project view and metrics
#[tokio::test]
async fn test_first_visit_walkthrough() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::default());
    let service = service_with(store.clone(), clock.clone());

    let session_id = service.initialize().await;
    assert!(!session_id.is_empty());
    assert!(service.visitor_id().await.is_some());
    assert_eq!(service.counter("totalVisitors").await, 1);
    assert_eq!(service.counter("totalSessions").await, 1);

    service.track_page_view("/projects", "Projects").await;
    assert_eq!(service.counter("totalPageViews").await, 1);
    assert_eq!(service.counter("page__projects").await, 1);

    service.track_event("project_view", None).await;
    assert_eq!(service.counter("totalProjectViews").await, 1);
    assert_eq!(service.counter("event_project_view").await, 1);

    assert_eq!(
        service.get_metrics().await,
        AnalyticsMetrics {
            total_visitors: 1,
            active_sessions: 1,
            total_project_views: 1,
        }
    );
    assert_eq!(service.session_id(), Some(session_id));
}

/// Two sessions share a store; one goes quiet past the window
#[tokio::test]
async fn test_inactive_session_is_pruned() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::default());

    // Each service plays the role of one browser tab with its own session slot
    let tracker = ActiveSessionTracker::new(store.clone(), clock.clone(), Duration::minutes(30));
    tracker.refresh("tab-a").await;
    tracker.refresh("tab-b").await;
    assert_eq!(tracker.count_active().await, 2);

    clock.advance(Duration::minutes(20));
    tracker.refresh("tab-b").await;

    clock.advance(Duration::minutes(11));
    let pruned = tracker.try_refresh_and_prune("tab-b").await.unwrap();

    assert_eq!(pruned, 1);
    assert_eq!(tracker.count_active().await, 1);
}

#[tokio::test]
async fn test_returning_visitor_after_expiry() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::default());

    let first_visit = service_with(store.clone(), clock.clone());
    let first_session = first_visit.initialize().await;
    let visitor = first_visit.visitor_id().await;

    clock.advance(Duration::hours(3));

    // New page load: a new service instance over the same profile
    let second_visit = service_with(store.clone(), clock.clone());
    let second_session = second_visit.initialize().await;

    assert_ne!(first_session, second_session);
    assert_eq!(second_visit.visitor_id().await, visitor);
    assert_eq!(second_visit.counter("totalSessions").await, 2);
    assert_eq!(second_visit.counter("totalVisitors").await, 1);

    // The first session's entry was pruned on initialize
    assert_eq!(second_visit.get_metrics().await.active_sessions, 1);
}

#[tokio::test]
async fn test_reload_within_window_resumes_session() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::default());

    let first = service_with(store.clone(), clock.clone());
    let session_id = first.initialize().await;
    first.track_page_view("/", "Home").await;

    clock.advance(Duration::minutes(25));

    let reloaded = service_with(store.clone(), clock.clone());
    assert_eq!(reloaded.initialize().await, session_id);
    assert_eq!(reloaded.counter("totalSessions").await, 1);

    // Activity keeps the session alive past its first 30 minutes
    reloaded.track_page_view("/about", "About").await;
    clock.advance(Duration::minutes(25));
    assert_eq!(reloaded.initialize().await, session_id);
}

#[tokio::test]
async fn test_total_outage_never_surfaces() {
    let store = Arc::new(FlakyStore::new());
    store.set_down(true);
    let clock = Arc::new(ManualClock::default());
    let service = service_with(store.clone(), clock);

    let session_id = service.initialize().await;
    assert!(!session_id.is_empty());
    assert_eq!(service.session_id(), Some(session_id));

    service.track_page_view("/projects", "Projects").await;
    service.track_event("project_view", Some("portfolio-site")).await;

    assert_eq!(service.get_metrics().await, AnalyticsMetrics::default());
    assert_eq!(service.counter("totalPageViews").await, 0);
    assert!(service.visitor_id().await.is_none());

    // Nothing was persisted during the outage
    store.set_down(false);
    assert!(store.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_outage_falls_back_per_operation() {
    let store = Arc::new(FlakyStore::new());
    let clock = Arc::new(ManualClock::default());
    let counters = CounterStore::new(store.clone());
    let tracker = ActiveSessionTracker::new(store.clone(), clock, Duration::minutes(30));

    counters.increment("totalPageViews").await;
    store.set_down(true);

    assert_eq!(counters.read("totalPageViews").await, 0);
    assert_eq!(tracker.count_active().await, 1);

    // A failed read does not clobber the stored value
    counters.increment("totalPageViews").await;
    store.set_down(false);
    assert_eq!(counters.read("totalPageViews").await, 1);
}

#[tokio::test]
async fn test_sequential_increments_are_exact() {
    let store = Arc::new(MemoryStore::new());
    let counters = CounterStore::new(store);

    for expected in 1..=100u64 {
        assert_eq!(counters.try_increment("event_download").await.unwrap(), expected);
    }
    assert_eq!(counters.read("event_download").await, 100);
}

#[tokio::test]
async fn test_profile_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analytics.json");
    let clock = Arc::new(ManualClock::default());

    let session_id = {
        let store = Arc::new(FileStore::open(&path).unwrap());
        let service = service_with(store, clock.clone());
        let session_id = service.initialize().await;
        service.track_event("project_view", None).await;
        session_id
    };

    let store = Arc::new(FileStore::open(&path).unwrap());
    let service = service_with(store, clock.clone());

    assert_eq!(service.initialize().await, session_id);
    assert_eq!(
        service.get_metrics().await,
        AnalyticsMetrics {
            total_visitors: 1,
            active_sessions: 1,
            total_project_views: 1,
        }
    );
}
