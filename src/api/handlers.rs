//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::debug;

use super::error::ApiResult;
use crate::cache::{LruCache, ShardedTtlCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::metrics::{MetricsSink, PrometheusSink};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, HealthResponse, LruAddRequest, SetResponse,
    StatsResponse, TtlSetRequest, TtlStatsResponse,
};

/// Application state shared across all handlers.
///
/// Both caches lock internally, so handlers call them directly without an
/// outer lock.
#[derive(Clone)]
pub struct AppState {
    pub ttl: Arc<ShardedTtlCache<String, String>>,
    pub lru: Arc<LruCache<String>>,
    pub metrics: Arc<PrometheusSink>,
    /// TTL applied to set requests that omit `ttl_ms`
    pub default_ttl: Duration,
}

impl AppState {
    /// Builds both caches from configuration and starts their sweepers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        let metrics = Arc::new(PrometheusSink::new());
        let sink: Arc<dyn MetricsSink> = metrics.clone();

        let lru = LruCache::<String>::builder()
            .config(config.lru_config())
            .on_evicted(|key, _value: String| debug!("LRU evicted key '{}'", key))
            .metrics(Arc::clone(&sink))
            .build()?;

        let ttl = ShardedTtlCache::with_metrics(config.ttl_shard_count, sink)?;
        ttl.start_cleanup_timer(config.ttl_cleanup_interval())?;

        Ok(Self {
            ttl: Arc::new(ttl),
            lru: Arc::new(lru),
            metrics,
            default_ttl: config.default_ttl(),
        })
    }

    /// Stops both caches' background sweeps and waits for them to exit.
    pub async fn shutdown(&self) {
        self.ttl.shutdown().await;
        self.lru.shutdown().await;
    }
}

// == TTL Cache Handlers ==
/// Handler for PUT /ttl/set
pub async fn ttl_set_handler(
    State(state): State<AppState>,
    Json(req): Json<TtlSetRequest>,
) -> ApiResult<Json<SetResponse>> {
    req.validate()?;

    let ttl = req
        .ttl_ms
        .map(Duration::from_millis)
        .unwrap_or(state.default_ttl);
    state.ttl.set(req.key.clone(), req.value, ttl);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /ttl/get/:key
///
/// Expired keys are reported as not found.
pub async fn ttl_get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<GetResponse>> {
    validate_key(&key)?;
    let value = state
        .ttl
        .get(key.as_str())
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /ttl/del/:key
pub async fn ttl_delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    validate_key(&key)?;
    let deleted = state.ttl.delete(key.as_str());
    Ok(Json(DeleteResponse::new(key, deleted)))
}

// == LRU Cache Handlers ==
/// Handler for PUT /lru/add
pub async fn lru_add_handler(
    State(state): State<AppState>,
    Json(req): Json<LruAddRequest>,
) -> ApiResult<Json<SetResponse>> {
    req.validate()?;
    state.lru.add(req.key.clone(), req.value);
    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /lru/get/:key
pub async fn lru_get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<GetResponse>> {
    validate_key(&key)?;
    let value = state
        .lru
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /lru/del/:key
pub async fn lru_delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    validate_key(&key)?;
    let deleted = state.lru.remove(&key).is_some();
    Ok(Json(DeleteResponse::new(key, deleted)))
}

// == Diagnostics Handlers ==
/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        lru: state.lru.stats().into(),
        ttl: TtlStatsResponse {
            shard_count: state.ttl.shard_count(),
            total_entries: state.ttl.len(),
            sweeping: state.ttl.is_sweeping(),
        },
    })
}

/// Handler for GET /metrics
///
/// Refreshes the LRU byte gauges before rendering so the scrape reflects
/// the current state rather than the last sweep.
pub async fn metrics_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.lru.publish_metrics();
    let body = state.metrics.render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
