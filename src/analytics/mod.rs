// Client-local analytics
// Visitor/session identity, named counters and an active-session estimate,
// all kept in one key-value store

pub mod active_sessions;
pub mod counters;
pub mod identity;
pub mod service;
pub mod types;

pub use active_sessions::{ActiveSessionMap, ActiveSessionTracker};
pub use counters::CounterStore;
pub use identity::IdentityManager;
pub use service::AnalyticsService;
pub use types::{AnalyticsConfig, AnalyticsMetrics, event_key, normalize_key_segment, page_key};
