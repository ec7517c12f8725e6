//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, lru_add_handler, lru_delete_handler, lru_get_handler, metrics_handler,
    stats_handler, ttl_delete_handler, ttl_get_handler, ttl_set_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let ttl = Router::new()
        .route("/set", put(ttl_set_handler))
        .route("/get/:key", get(ttl_get_handler))
        .route("/del/:key", delete(ttl_delete_handler));

    let lru = Router::new()
        .route("/add", put(lru_add_handler))
        .route("/get/:key", get(lru_get_handler))
        .route("/del/:key", delete(lru_delete_handler));

    Router::new()
        .nest("/ttl", ttl)
        .nest("/lru", lru)
        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
