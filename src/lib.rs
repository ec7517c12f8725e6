//! Hotcache - in-process caches with background maintenance
//!
//! Provides a byte-budgeted LRU cache with an idle-entry sweep and a sharded
//! TTL cache with lazy and active expiration, plus a small HTTP server that
//! exposes both.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{ByteSize, CacheStats, EmptyValue, LruCache, LruConfig, ShardedTtlCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use metrics::{MetricsSink, NoopSink, PrometheusSink, RecordingSink};
