//! Background Tasks Module
//!
//! Contains the periodic sweep tasks both caches run for their lifetime.
//!
//! # Tasks
//! - LRU staleness sweep: removes idle entries and publishes byte gauges
//! - TTL shard sweep: one task per shard, reclaims expired entries

mod sweep;

pub use sweep::{spawn_sweep_task, Sweeper};
