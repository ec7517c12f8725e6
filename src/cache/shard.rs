//! TTL Shard Module
//!
//! One independently locked partition of a [`ShardedTtlCache`](super::ShardedTtlCache).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::time::Instant;

use crate::cache::Item;
use crate::metrics::{
    MetricsSink, LABEL_METHOD, LABEL_SHARD_ID, TTL_EXPIRED, TTL_TOTAL, TTL_USAGE_SECONDS,
};

// == Sweep Report ==
/// Outcome of one sweep pass over a shard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries present when the scan started
    pub total: usize,
    /// Entries found expired during the scan
    pub expired: usize,
}

// == Shard ==
/// A key to [`Item`] map behind its own read/write lock.
///
/// Reads share the lock; writes and deletions take it exclusively. An
/// expired item may linger until the next read of its key or the next
/// sweep, so every read re-checks expiration.
pub struct Shard<K, V> {
    id: String,
    items: RwLock<HashMap<K, Item<V>>>,
    metrics: Arc<dyn MetricsSink>,
}

impl<K, V> Shard<K, V>
where
    K: Hash + Eq,
{
    pub(crate) fn new(id: String, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            id,
            items: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    /// Stable id used as the `shard_id` metric label.
    pub fn id(&self) -> &str {
        &self.id
    }

    // == Set ==
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let start = std::time::Instant::now();
        let item = Item::new(value, ttl);
        self.items.write().insert(key, item);
        self.observe("set", start);
    }

    // == Get ==
    /// Returns the value if present and not expired.
    ///
    /// An expired item is deleted on the way out. The read lock is released
    /// before the write lock is taken, and the deletion re-checks expiry so
    /// a value written in between survives.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let start = std::time::Instant::now();
        let (value, expired) = {
            let items = self.items.read();
            match items.get(key) {
                Some(item) if item.is_expired() => (None, true),
                Some(item) => (Some(item.value.clone()), false),
                None => (None, false),
            }
        };
        if expired {
            self.remove_if_expired(key, Instant::now());
        }
        self.observe("get", start);
        value
    }

    // == Delete ==
    /// Removes a key; a no-op when absent. Returns whether anything was removed.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let start = std::time::Instant::now();
        let removed = self.items.write().remove(key).is_some();
        self.observe("delete", start);
        removed
    }

    /// Raw presence, ignoring expiration.
    pub fn holds<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.items.read().contains_key(key)
    }

    /// Presence of a live (unexpired) entry.
    pub fn contains_live<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.items
            .read()
            .get(key)
            .map(|item| !item.is_expired())
            .unwrap_or(false)
    }

    /// Number of stored items, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn remove_if_expired<Q>(&self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut items = self.items.write();
        let expired = items
            .get(key)
            .map(|item| item.is_expired_at(now))
            .unwrap_or(false);
        if expired {
            items.remove(key);
        }
        expired
    }

    fn observe(&self, method: &str, start: std::time::Instant) {
        self.metrics.observe_histogram(
            TTL_USAGE_SECONDS,
            &[(LABEL_SHARD_ID, self.id.as_str()), (LABEL_METHOD, method)],
            start.elapsed().as_secs_f64(),
        );
    }

    #[cfg(test)]
    pub(crate) fn lock_exclusive(
        &self,
    ) -> parking_lot::RwLockWriteGuard<'_, HashMap<K, Item<V>>> {
        self.items.write()
    }
}

impl<K, V> Shard<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Sweep ==
    /// Scans the whole shard under the read lock, then deletes each expired
    /// key under its own short write lock, and publishes the totals.
    pub fn sweep(&self) -> SweepReport {
        let now = Instant::now();
        let (total, expired_keys) = {
            let items = self.items.read();
            let expired: Vec<K> = items
                .iter()
                .filter(|(_, item)| item.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();
            (items.len(), expired)
        };

        for key in &expired_keys {
            self.remove_if_expired(key, now);
        }

        let report = SweepReport {
            total,
            expired: expired_keys.len(),
        };
        let labels = [(LABEL_SHARD_ID, self.id.as_str())];
        self.metrics.set_gauge(TTL_TOTAL, &labels, report.total as f64);
        self.metrics.set_gauge(TTL_EXPIRED, &labels, report.expired as f64);
        report
    }

    /// Keys of live entries.
    pub fn keys(&self) -> Vec<K> {
        let now = Instant::now();
        self.items
            .read()
            .iter()
            .filter(|(_, item)| !item.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl<K, V> fmt::Debug for Shard<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard")
            .field("id", &self.id)
            .field("len", &self.items.read().len())
            .finish()
    }
}
