//! Sharded TTL Cache Module
//!
//! Partitions the key space across independently locked shards so that
//! operations on different shards never contend.

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::cache::shard::{Shard, SweepReport};
use crate::error::{CacheError, Result};
use crate::metrics::{MetricsSink, NoopSink};
use crate::tasks::Sweeper;

// == Sharded TTL Cache ==
/// TTL cache split into a fixed number of shards.
///
/// A key is routed to shard `hash(key) % shard_count`. The hasher is
/// unseeded, so routing is identical across calls and for the whole life
/// of the cache.
///
/// Expiration is enforced lazily by `get` and actively by per-shard sweep
/// tasks started with [`start_cleanup_timer`](Self::start_cleanup_timer).
pub struct ShardedTtlCache<K, V> {
    shards: Arc<[Shard<K, V>]>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<K, V> ShardedTtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache with `shard_count` shards. Zero shards is rejected.
    pub fn new(shard_count: usize) -> Result<Self> {
        Self::with_metrics(shard_count, Arc::new(NoopSink))
    }

    pub fn with_metrics(shard_count: usize, metrics: Arc<dyn MetricsSink>) -> Result<Self> {
        if shard_count == 0 {
            return Err(CacheError::ZeroShards);
        }
        let shards: Vec<Shard<K, V>> = (0..shard_count)
            .map(|i| Shard::new(i.to_string(), Arc::clone(&metrics)))
            .collect();

        Ok(Self {
            shards: shards.into(),
            sweeper: Mutex::new(None),
        })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    // == Routing ==
    /// Index of the shard owning `key`.
    pub fn shard_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// The shard owning `key`.
    pub fn routing_shard<Q>(&self, key: &Q) -> &Shard<K, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        &self.shards[self.shard_index(key)]
    }

    pub fn shards(&self) -> &[Shard<K, V>] {
        &self.shards
    }

    // == Set ==
    /// Stores `value` under `key` until `ttl` elapses, replacing any previous
    /// entry. A zero TTL stores an already expired entry.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let shard = self.routing_shard(&key);
        shard.set(key, value, ttl);
    }

    // == Get ==
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.routing_shard(key).get(key)
    }

    // == Delete ==
    /// Removes `key` if present. Returns whether anything was removed.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.routing_shard(key).delete(key)
    }

    /// True if `key` holds an unexpired value. Does not reclaim expired entries.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.routing_shard(key).contains_live(key)
    }

    /// Stored entries across all shards, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.is_empty())
    }

    /// Keys of live entries across all shards, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.shards.iter().flat_map(|shard| shard.keys()).collect()
    }

    // == Sweeping ==
    /// Runs one sweep pass over every shard on the calling thread.
    pub fn sweep_now(&self) -> Vec<SweepReport> {
        self.shards.iter().map(|shard| shard.sweep()).collect()
    }

    /// Starts one sweep task per shard, each firing every `interval`.
    ///
    /// Calling this again replaces the running tasks. Must be called from
    /// within a Tokio runtime.
    pub fn start_cleanup_timer(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(CacheError::ZeroInterval);
        }
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let sweeper = Sweeper::new();
        for idx in 0..self.shards.len() {
            let shards = Arc::clone(&self.shards);
            sweeper.spawn(&runtime, format!("ttl shard {}", idx), interval, move || {
                let report = shards[idx].sweep();
                if report.expired > 0 {
                    debug!(
                        "TTL shard {} sweep: removed {} of {} entries",
                        idx, report.expired, report.total
                    );
                }
            });
        }

        if let Some(previous) = self.sweeper.lock().replace(sweeper) {
            info!("Replacing running TTL cleanup timers");
            previous.stop();
        }
        Ok(())
    }

    /// Stops the sweep tasks without waiting for them.
    pub fn close(&self) {
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.stop();
        }
    }

    /// Stops the sweep tasks and waits until they have exited.
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            sweeper.shutdown().await;
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .map(|sweeper| sweeper.is_running())
            .unwrap_or(false)
    }
}

impl<K, V> fmt::Debug for ShardedTtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedTtlCache")
            .field("shards", &self.shards)
            .field("sweeper", &self.sweeper)
            .finish()
    }
}
