//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /ttl/set`, `GET /ttl/get/:key`, `DELETE /ttl/del/:key` - TTL cache
//! - `PUT /lru/add`, `GET /lru/get/:key`, `DELETE /lru/del/:key` - LRU cache
//! - `GET /stats` - Statistics for both caches
//! - `GET /metrics` - Prometheus text exposition
//! - `GET /health` - Health check endpoint

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use handlers::*;
pub use routes::create_router;
