//! LRU Store Module
//!
//! Unlocked engine behind [`LruCache`](super::LruCache): an unbounded
//! `lru::LruCache` for recency order, with byte accounting against a budget.

use std::time::Duration;

use ::lru::LruCache as RecencyMap;
use tokio::time::Instant;

use crate::cache::{ByteSize, CacheStats, Entry};

/// Key/value pairs removed by the store, in removal order.
pub type Evicted<V> = Vec<(String, V)>;

// == LRU Store ==
/// Byte-budgeted storage ordered by recency.
///
/// The recency map is unbounded; the byte budget alone decides eviction.
///
/// Invariants kept by every method:
/// - `cur_bytes` equals the sum of `key.len() + value.byte_len()` over
///   resident entries
/// - after `add` returns, `max_bytes == 0 || cur_bytes <= max_bytes`
#[derive(Debug)]
pub struct LruStore<V> {
    max_bytes: u64,
    cur_bytes: u64,
    entries: RecencyMap<String, Entry<V>>,
    stats: CacheStats,
}

impl<V: ByteSize> LruStore<V> {
    // == Constructor ==
    /// Creates an empty store. A budget of 0 means unbounded.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            cur_bytes: 0,
            entries: RecencyMap::unbounded(),
            stats: CacheStats::new(),
        }
    }

    // == Get ==
    /// Looks up a key, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.stats.record_hit();
                entry.last_access = Instant::now();
                Some(&entry.value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Looks up a key without touching recency or statistics.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.peek(key).map(|entry| &entry.value)
    }

    // == Add ==
    /// Inserts or overwrites a key, then evicts from the back until the
    /// budget holds again.
    ///
    /// The entry just written is not protected: if it alone exceeds the
    /// budget it is evicted too.
    pub fn add(&mut self, key: String, value: V) -> Evicted<V> {
        let entry = Entry::new(value);
        self.cur_bytes += entry.size(&key);
        if let Some(old) = self.entries.put(key.clone(), entry) {
            self.cur_bytes -= old.size(&key);
        }

        self.enforce_budget()
    }

    // == Remove ==
    /// Removes a key explicitly. This is not an eviction.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.pop(key)?;
        self.cur_bytes -= entry.size(key);
        Some(entry.value)
    }

    // == Remove Stale ==
    /// Removes entries from the back of the recency order while they have
    /// been idle for longer than `max_idle`.
    ///
    /// Idle time never increases towards the front, so the first fresh
    /// entry ends the scan.
    pub fn remove_stale(&mut self, now: Instant, max_idle: Duration) -> Evicted<V> {
        let mut removed = Vec::new();
        while let Some((_, entry)) = self.entries.peek_lru() {
            if !entry.is_stale(now, max_idle) {
                break;
            }
            match self.pop_oldest() {
                Some(pair) => removed.push(pair),
                None => break,
            }
        }
        self.stats.record_stale(removed.len());
        removed
    }

    // == Accessors ==
    pub fn cur_bytes(&self) -> u64 {
        self.cur_bytes
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.used_bytes = self.cur_bytes;
        stats.max_bytes = self.max_bytes;
        stats
    }

    fn enforce_budget(&mut self) -> Evicted<V> {
        let mut evicted = Vec::new();
        while self.max_bytes != 0 && self.cur_bytes > self.max_bytes {
            match self.pop_oldest() {
                Some(pair) => evicted.push(pair),
                None => break,
            }
        }
        self.stats.record_evictions(evicted.len());
        evicted
    }

    fn pop_oldest(&mut self) -> Option<(String, V)> {
        let (key, entry) = self.entries.pop_lru()?;
        self.cur_bytes -= entry.size(&key);
        Some((key, entry.value))
    }

    /// Recomputes the byte total from scratch.
    #[cfg(test)]
    pub(crate) fn recount_bytes(&self) -> u64 {
        self.entries.iter().map(|(key, entry)| entry.size(key)).sum()
    }

    /// Moves `key` to the front with a given access time.
    #[cfg(test)]
    pub(crate) fn touch_at(&mut self, key: &str, at: Instant) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_access = at;
        }
    }
}
