// Library exports for the host binary and tests
pub mod analytics;
pub mod clock;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod storage;

pub use analytics::{AnalyticsConfig, AnalyticsMetrics, AnalyticsService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
