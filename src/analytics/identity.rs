// Visitor and session identity
// A visitor id lives for the life of the store; a session id is replaced
// after a period of inactivity

use super::active_sessions::ActiveSessionTracker;
use super::counters::CounterStore;
use super::types::{
    LAST_ACTIVITY_KEY, SESSION_ID_KEY, TOTAL_SESSIONS, TOTAL_VISITORS, VISITOR_ID_KEY,
};
use crate::clock::Clock;
use crate::metrics::{record_storage_failure, record_tracked};
use crate::storage::{KeyValueStore, StorageError, get_item, set_item};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Identity manager
pub struct IdentityManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    counters: CounterStore,
    tracker: ActiveSessionTracker,
    timeout: Duration,
    current_session: RwLock<Option<String>>,
}

impl IdentityManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        counters: CounterStore,
        tracker: ActiveSessionTracker,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            counters,
            tracker,
            timeout,
            current_session: RwLock::new(None),
        }
    }

    /// Session id held by this manager, if any
    pub fn session_id(&self) -> Option<String> {
        self.current_session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_session_id(&self, session_id: &str) {
        *self
            .current_session
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(session_id.to_string());
    }

    /// Read an identity slot; a corrupt value is treated as absent
    async fn read_slot<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match get_item::<T>(self.store.as_ref(), key).await {
            Err(StorageError::Malformed { reason, .. }) => {
                warn!("Ignoring malformed {}: {}", key, reason);
                Ok(None)
            }
            other => other,
        }
    }

    /// Persisted visitor id, if one has been created
    pub async fn visitor_id(&self) -> Option<String> {
        match self.read_slot::<String>(VISITOR_ID_KEY).await {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                warn!("Visitor id read error: {}", e);
                record_storage_failure("visitor_read");
                None
            }
        }
    }

    /// Ensure a visitor id and a live session exist, returning the session id
    ///
    /// `totalVisitors` only moves when the visitor id is created in the same
    /// call that starts a new session.
    pub async fn try_initialize(&self) -> Result<String, StorageError> {
        let mut is_new_visitor = false;

        let visitor_id = self
            .read_slot::<String>(VISITOR_ID_KEY)
            .await?
            .filter(|id| !id.is_empty());
        if visitor_id.is_none() {
            let visitor_id = uuid::Uuid::new_v4().to_string();
            set_item(self.store.as_ref(), VISITOR_ID_KEY, &visitor_id).await?;
            is_new_visitor = true;
            info!("Created visitor {}", visitor_id);
        }

        let stored_session = self
            .read_slot::<String>(SESSION_ID_KEY)
            .await?
            .filter(|id| !id.is_empty());
        let last_activity = self
            .read_slot::<DateTime<Utc>>(LAST_ACTIVITY_KEY)
            .await?;
        let now = self.clock.now();

        let session_id = match (stored_session, last_activity) {
            (Some(session_id), Some(last)) if now - last <= self.timeout => session_id,
            _ => {
                let session_id = uuid::Uuid::new_v4().to_string();
                set_item(self.store.as_ref(), SESSION_ID_KEY, &session_id).await?;

                self.counters.increment(TOTAL_SESSIONS).await;
                if is_new_visitor {
                    self.counters.increment(TOTAL_VISITORS).await;
                }

                record_tracked("session_started");
                info!(
                    "Started session {} (new visitor: {})",
                    session_id, is_new_visitor
                );
                session_id
            }
        };
        self.set_session_id(&session_id);

        set_item(self.store.as_ref(), LAST_ACTIVITY_KEY, &now).await?;
        self.tracker.refresh_and_prune(&session_id).await;

        Ok(session_id)
    }

    /// Like `try_initialize`, but always yields a usable session id
    ///
    /// On failure the id is freshly minted and not persisted.
    pub async fn initialize(&self) -> String {
        match self.try_initialize().await {
            Ok(session_id) => session_id,
            Err(e) => {
                warn!("Analytics initialization error: {}", e);
                record_storage_failure("initialize");
                let session_id = uuid::Uuid::new_v4().to_string();
                self.set_session_id(&session_id);
                session_id
            }
        }
    }

    /// Record activity at the current time
    pub async fn touch(&self) {
        let now = self.clock.now();
        if let Err(e) = set_item(self.store.as_ref(), LAST_ACTIVITY_KEY, &now).await {
            warn!("Last activity update error: {}", e);
            record_storage_failure("touch");
        }
    }
}
