//! Cache Module
//!
//! Provides two in-memory caches:
//! - [`LruCache`]: byte-budgeted LRU with an idle-entry sweep
//! - [`ShardedTtlCache`]: per-entry TTL map split across independently locked shards

mod entry;
mod lru;
mod shard;
mod sharded;
mod stats;
mod store;


// Re-export public types
pub use entry::{ByteSize, EmptyValue, Entry, Item};
pub use lru::{
    LruCache, LruCacheBuilder, LruConfig, OnEvicted, DEFAULT_STALE_AFTER, DEFAULT_SWEEP_INTERVAL,
};
pub use shard::{Shard, SweepReport};
pub use sharded::ShardedTtlCache;
pub use stats::CacheStats;
pub use store::{Evicted, LruStore};

// == Public Constants ==
/// Maximum allowed key length in bytes for keys arriving over HTTP
pub const MAX_KEY_LENGTH: usize = 256;
