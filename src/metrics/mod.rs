//! Metrics Module
//!
//! The caches push usage statistics into a [`MetricsSink`] and never read
//! from it. Which backend receives them is up to the owner of the cache.

mod prometheus_sink;
mod recording;

pub use prometheus_sink::PrometheusSink;
pub use recording::RecordingSink;

// == Metric Names ==
/// Bytes currently held by an LRU cache.
pub const LRU_USED_BYTES: &str = "cache_used_bytes";
/// Configured byte budget of an LRU cache.
pub const LRU_TOTAL_BYTES: &str = "cache_total_bytes";
/// Entries seen by the last sweep of a TTL shard.
pub const TTL_TOTAL: &str = "ttlcache_total";
/// Expired entries reclaimed by the last sweep of a TTL shard.
pub const TTL_EXPIRED: &str = "ttlcache_expired";
/// Latency of TTL shard operations in seconds.
pub const TTL_USAGE_SECONDS: &str = "ttlcache_usage_seconds";

/// Label carrying the shard id.
pub const LABEL_SHARD_ID: &str = "shard_id";
/// Label carrying the operation name (`get`, `set`, `delete`).
pub const LABEL_METHOD: &str = "method";

// == Metrics Sink ==
/// Destination for gauge and histogram observations.
///
/// Implementations must be cheap to call: shard operations record a
/// histogram sample on every get, set and delete.
pub trait MetricsSink: Send + Sync + std::fmt::Debug {
    /// Sets a gauge to `value`.
    fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64);

    /// Records one histogram sample.
    fn observe_histogram(&self, name: &str, labels: &[(&str, &str)], value: f64);
}

// == Noop Sink ==
/// Sink that discards every observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn set_gauge(&self, _name: &str, _labels: &[(&str, &str)], _value: f64) {}

    fn observe_histogram(&self, _name: &str, _labels: &[(&str, &str)], _value: f64) {}
}
