//! LRU Cache Module
//!
//! Thread-safe, byte-budgeted cache with a background staleness sweep.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::store::{Evicted, LruStore};
use crate::cache::{ByteSize, CacheStats};
use crate::error::{CacheError, Result};
use crate::metrics::{MetricsSink, NoopSink, LRU_TOTAL_BYTES, LRU_USED_BYTES};
use crate::tasks::Sweeper;

/// Default idle time after which an entry counts as stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);

/// Default period of the staleness sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Callback receiving every entry the cache removes on its own.
pub type OnEvicted<V> = Box<dyn Fn(String, V) + Send + Sync>;

// == Config ==
#[derive(Debug, Clone, PartialEq)]
pub struct LruConfig {
    /// Byte budget, 0 for unbounded
    pub max_bytes: u64,
    /// Period of the background staleness sweep
    pub sweep_interval: Duration,
    /// Idle time after which the sweep removes an entry
    pub stale_after: Duration,
}

impl LruConfig {
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }
}

impl Default for LruConfig {
    fn default() -> Self {
        Self {
            max_bytes: 0,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

struct Shared<V> {
    store: Mutex<LruStore<V>>,
    on_evicted: Option<OnEvicted<V>>,
    metrics: Arc<dyn MetricsSink>,
    stale_after: Duration,
}

impl<V: ByteSize> Shared<V> {
    /// Runs the eviction callback. Must be called with the store unlocked.
    fn notify(&self, evicted: Evicted<V>) {
        if let Some(callback) = &self.on_evicted {
            for (key, value) in evicted {
                callback(key, value);
            }
        }
    }

    fn remove_stale(&self) -> usize {
        let removed = self
            .store
            .lock()
            .remove_stale(Instant::now(), self.stale_after);
        let count = removed.len();
        self.notify(removed);
        count
    }

    fn publish(&self) {
        let (used, total) = {
            let store = self.store.lock();
            (store.cur_bytes(), store.max_bytes())
        };
        self.metrics.set_gauge(LRU_USED_BYTES, &[], used as f64);
        self.metrics.set_gauge(LRU_TOTAL_BYTES, &[], total as f64);
    }
}

// == LRU Cache ==
/// Size-bounded cache keeping the most recently used entries resident.
///
/// One mutex guards the whole structure; `get` takes it exclusively since a
/// hit reorders the recency list. Eviction callbacks run after the lock is
/// released, so a callback may call back into the same cache.
///
/// A sweep task started at construction removes entries idle for longer
/// than `stale_after` and publishes `cache_used_bytes` / `cache_total_bytes`.
/// It stops on [`close`](Self::close), [`shutdown`](Self::shutdown) or drop.
///
/// # Example
/// ```ignore
/// let cache = LruCache::builder()
///     .max_bytes(1024)
///     .on_evicted(|key, _value: String| println!("evicted {}", key))
///     .build()?;
/// cache.add("greeting", "hello".to_string());
/// assert_eq!(cache.get("greeting"), Some("hello".to_string()));
/// ```
pub struct LruCache<V> {
    shared: Arc<Shared<V>>,
    sweeper: Sweeper,
}

impl<V> LruCache<V>
where
    V: ByteSize + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache with a byte budget (0 = unbounded) and an optional
    /// eviction callback, using the default sweep settings.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(max_bytes: u64, on_evicted: Option<OnEvicted<V>>) -> Result<Self> {
        Self::with_config(LruConfig::with_max_bytes(max_bytes), on_evicted, Arc::new(NoopSink))
    }

    pub fn builder() -> LruCacheBuilder<V> {
        LruCacheBuilder::new()
    }

    pub fn with_config(
        config: LruConfig,
        on_evicted: Option<OnEvicted<V>>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        if config.sweep_interval.is_zero() {
            return Err(CacheError::ZeroInterval);
        }
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let shared = Arc::new(Shared {
            store: Mutex::new(LruStore::new(config.max_bytes)),
            on_evicted,
            metrics,
            stale_after: config.stale_after,
        });

        let sweeper = Sweeper::new();
        let task_shared = Arc::clone(&shared);
        sweeper.spawn(&runtime, "lru", config.sweep_interval, move || {
            let removed = task_shared.remove_stale();
            if removed > 0 {
                debug!("LRU sweep: removed {} stale entries", removed);
            }
            task_shared.publish();
        });

        Ok(Self { shared, sweeper })
    }

    // == Get ==
    /// Returns a clone of the value and marks the key most recently used.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.shared.store.lock().get(key).cloned()
    }

    // == Add ==
    /// Inserts or overwrites a key, evicting least recently used entries
    /// until the byte budget holds.
    pub fn add(&self, key: impl Into<String>, value: V) {
        let evicted = self.shared.store.lock().add(key.into(), value);
        if !evicted.is_empty() {
            debug!("LRU add: evicted {} entries to fit budget", evicted.len());
        }
        self.shared.notify(evicted);
    }

    // == Remove ==
    /// Removes a key without invoking the eviction callback.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.shared.store.lock().remove(key)
    }

    // == Remove Stale Entries ==
    /// Removes entries idle for longer than the configured window, oldest
    /// first, and returns how many were removed.
    pub fn remove_stale_entries(&self) -> usize {
        self.shared.remove_stale()
    }

    /// Pushes the byte gauges to the metrics sink now.
    pub fn publish_metrics(&self) {
        self.shared.publish();
    }

    pub fn cur_bytes(&self) -> u64 {
        self.shared.store.lock().cur_bytes()
    }

    pub fn max_bytes(&self) -> u64 {
        self.shared.store.lock().max_bytes()
    }

    pub fn len(&self) -> usize {
        self.shared.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.store.lock().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.shared.store.lock().contains(key)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.shared.store.lock().keys()
    }

    pub fn stats(&self) -> CacheStats {
        self.shared.store.lock().stats()
    }

    // == Lifecycle ==
    /// Stops the sweep task without waiting for it.
    pub fn close(&self) {
        self.sweeper.stop();
    }

    /// Stops the sweep task and waits until it has exited.
    pub async fn shutdown(&self) {
        self.sweeper.shutdown().await;
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper.is_running()
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("stale_after", &self.shared.stale_after)
            .field("has_callback", &self.shared.on_evicted.is_some())
            .field("sweeper", &self.sweeper)
            .finish()
    }
}

// == Builder ==
pub struct LruCacheBuilder<V> {
    config: LruConfig,
    on_evicted: Option<OnEvicted<V>>,
    metrics: Arc<dyn MetricsSink>,
}

impl<V> LruCacheBuilder<V>
where
    V: ByteSize + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            config: LruConfig::default(),
            on_evicted: None,
            metrics: Arc::new(NoopSink),
        }
    }

    pub fn config(mut self, config: LruConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.config.max_bytes = max_bytes;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.config.stale_after = stale_after;
        self
    }

    pub fn on_evicted<F>(mut self, callback: F) -> Self
    where
        F: Fn(String, V) + Send + Sync + 'static,
    {
        self.on_evicted = Some(Box::new(callback));
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn build(self) -> Result<LruCache<V>> {
        LruCache::with_config(self.config, self.on_evicted, self.metrics)
    }
}

impl<V> Default for LruCacheBuilder<V>
where
    V: ByteSize + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
