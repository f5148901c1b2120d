// Named integer counters kept in the key-value store

use crate::metrics::record_storage_failure;
use crate::storage::{KeyValueStore, StorageError, get_item, set_item};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Counter store
///
/// A missing or malformed value counts as 0. Increments are a plain
/// read-then-write and can lose updates under interleaving.
#[derive(Clone)]
pub struct CounterStore {
    store: Arc<dyn KeyValueStore>,
}

impl CounterStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read a counter, propagating storage failures
    pub async fn try_read(&self, key: &str) -> Result<u64, StorageError> {
        match get_item::<Value>(self.store.as_ref(), key).await {
            Ok(Some(value)) => Ok(value.as_u64().unwrap_or_else(|| {
                warn!("Counter {} holds non-numeric value {}, reading as 0", key, value);
                0
            })),
            Ok(None) => Ok(0),
            Err(StorageError::Malformed { key, reason }) => {
                warn!("Counter {} is malformed ({}), reading as 0", key, reason);
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Increment a counter by one, returning the new value
    pub async fn try_increment(&self, key: &str) -> Result<u64, StorageError> {
        let next = self.try_read(key).await?.saturating_add(1);
        set_item(self.store.as_ref(), key, &next).await?;
        Ok(next)
    }

    /// Read a counter, substituting 0 on any failure
    pub async fn read(&self, key: &str) -> u64 {
        match self.try_read(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Counter read error for {}: {}", key, e);
                record_storage_failure("counter_read");
                0
            }
        }
    }

    /// Increment a counter, logging and absorbing any failure
    pub async fn increment(&self, key: &str) {
        if let Err(e) = self.try_increment(key).await {
            warn!("Counter increment error for {}: {}", key, e);
            record_storage_failure("counter_increment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn counters() -> (Arc<MemoryStore>, CounterStore) {
        let store = Arc::new(MemoryStore::new());
        let counters = CounterStore::new(store.clone());
        (store, counters)
    }

    #[tokio::test]
    async fn test_sequential_increments() {
        let (_, counters) = counters();

        for _ in 0..25 {
            counters.increment("totalPageViews").await;
        }

        assert_eq!(counters.read("totalPageViews").await, 25);
    }

    #[tokio::test]
    async fn test_missing_counter_reads_zero() {
        let (_, counters) = counters();
        assert_eq!(counters.read("never_written").await, 0);
    }

    #[tokio::test]
    async fn test_malformed_counter_restarts_from_zero() {
        let (store, counters) = counters();
        store
            .set_raw("totalVisitors", "not json".to_string())
            .await
            .unwrap();
        assert_eq!(counters.read("totalVisitors").await, 0);

        store
            .set_raw("totalSessions", "\"seven\"".to_string())
            .await
            .unwrap();
        assert_eq!(counters.try_increment("totalSessions").await.unwrap(), 1);

        store.set_raw("totalProjectViews", "-4".to_string()).await.unwrap();
        assert_eq!(counters.read("totalProjectViews").await, 0);
    }

    #[tokio::test]
    async fn test_counters_are_independent() {
        let (_, counters) = counters();
        counters.increment("event_project_view").await;
        counters.increment("event_project_view").await;
        counters.increment("event_contact").await;

        assert_eq!(counters.read("event_project_view").await, 2);
        assert_eq!(counters.read("event_contact").await, 1);
    }
}
