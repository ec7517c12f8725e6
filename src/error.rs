//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror. Absence of a key is not
//! an error inside the caches themselves (lookups return `Option`); the
//! `NotFound` variant exists for the HTTP surface.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A sharded cache needs at least one shard
    #[error("Shard count must be at least 1")]
    ZeroShards,

    /// A sweep interval of zero would spin the background task
    #[error("Sweep interval must be greater than zero")]
    ZeroInterval,

    /// Background sweeps need a Tokio runtime to be spawned on
    #[error("No Tokio runtime available to spawn the sweep task")]
    NoRuntime,

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
