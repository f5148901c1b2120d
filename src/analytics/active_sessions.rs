// Active-session tracking
// Approximates concurrent sessions with a session-id -> last-activity map,
// pruned lazily whenever a session is initialized

use super::types::ACTIVE_SESSIONS_KEY;
use crate::clock::Clock;
use crate::metrics::record_storage_failure;
use crate::storage::{KeyValueStore, StorageError, get_item, set_item};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub type ActiveSessionMap = HashMap<String, DateTime<Utc>>;

/// Active-session tracker
#[derive(Clone)]
pub struct ActiveSessionTracker {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl ActiveSessionTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            store,
            clock,
            timeout,
        }
    }

    async fn load(&self) -> Result<ActiveSessionMap, StorageError> {
        Ok(get_item::<ActiveSessionMap>(self.store.as_ref(), ACTIVE_SESSIONS_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Load for a read-modify-write; a corrupt map is replaced rather than kept
    async fn load_for_write(&self) -> Result<ActiveSessionMap, StorageError> {
        match self.load().await {
            Err(StorageError::Malformed { reason, .. }) => {
                warn!("Discarding malformed active session map: {}", reason);
                Ok(ActiveSessionMap::new())
            }
            other => other,
        }
    }

    fn cutoff(&self) -> DateTime<Utc> {
        self.clock.now() - self.timeout
    }

    /// Stamp `session_id` with the current time without pruning
    pub async fn try_refresh(&self, session_id: &str) -> Result<(), StorageError> {
        let mut sessions = self.load_for_write().await?;
        sessions.insert(session_id.to_string(), self.clock.now());
        set_item(self.store.as_ref(), ACTIVE_SESSIONS_KEY, &sessions).await
    }

    /// Drop entries at or before the cutoff, then stamp `session_id`
    ///
    /// Returns the number of entries dropped.
    pub async fn try_refresh_and_prune(&self, session_id: &str) -> Result<usize, StorageError> {
        let sessions = self.load_for_write().await?;
        let before = sessions.len();
        let cutoff = self.cutoff();

        let mut retained: ActiveSessionMap = sessions
            .into_iter()
            .filter(|(_, last_seen)| *last_seen > cutoff)
            .collect();
        let pruned = before - retained.len();

        retained.insert(session_id.to_string(), self.clock.now());
        set_item(self.store.as_ref(), ACTIVE_SESSIONS_KEY, &retained).await?;

        if pruned > 0 {
            debug!("Pruned {} inactive session(s)", pruned);
        }
        Ok(pruned)
    }

    /// Count sessions active within the timeout window
    pub async fn try_count_active(&self) -> Result<u64, StorageError> {
        let sessions = self.load().await?;
        let cutoff = self.cutoff();
        Ok(sessions
            .values()
            .filter(|last_seen| **last_seen > cutoff)
            .count() as u64)
    }

    pub async fn refresh(&self, session_id: &str) {
        if let Err(e) = self.try_refresh(session_id).await {
            warn!("Session activity update error: {}", e);
            record_storage_failure("session_refresh");
        }
    }

    pub async fn refresh_and_prune(&self, session_id: &str) {
        if let Err(e) = self.try_refresh_and_prune(session_id).await {
            warn!("Active sessions update error: {}", e);
            record_storage_failure("session_prune");
        }
    }

    /// Count active sessions, assuming at least the caller's own on failure
    pub async fn count_active(&self) -> u64 {
        match self.try_count_active().await {
            Ok(count) => count,
            Err(e) => {
                warn!("Active session count error: {}", e);
                record_storage_failure("session_count");
                1
            }
        }
    }
}
