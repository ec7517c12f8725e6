//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use hotcache::{api::create_router, AppState, Config};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn test_state(config: Config) -> AppState {
    AppState::from_config(&config).unwrap()
}

fn create_test_app() -> Router {
    create_router(test_state(Config::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// == TTL Endpoint Tests ==

#[tokio::test]
async fn test_ttl_set_endpoint_success() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/ttl/set",
        Some(r#"{"key":"test_key","value":"test_value"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
}

#[tokio::test]
async fn test_ttl_set_then_get() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/ttl/set",
        Some(r#"{"key":"get_key","value":"get_value","ttl_ms":60000}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/ttl/get/get_key", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "get_key");
    assert_eq!(json["value"], "get_value");
}

#[tokio::test]
async fn test_ttl_zero_ttl_reads_as_missing() {
    let app = create_test_app();

    send(
        &app,
        "PUT",
        "/ttl/set",
        Some(r#"{"key":"gone","value":"v","ttl_ms":0}"#),
    )
    .await;

    let response = send(&app, "GET", "/ttl/get/gone", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("gone"));
}

#[tokio::test]
async fn test_ttl_delete_is_idempotent() {
    let app = create_test_app();

    send(&app, "PUT", "/ttl/set", Some(r#"{"key":"k","value":"v"}"#)).await;

    let response = send(&app, "DELETE", "/ttl/del/k", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["deleted"], true);

    let response = send(&app, "DELETE", "/ttl/del/k", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["deleted"], false);

    let response = send(&app, "GET", "/ttl/get/k", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == LRU Endpoint Tests ==

#[tokio::test]
async fn test_lru_add_then_get() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/lru/add",
        Some(r#"{"key":"page","value":"<html>"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/lru/get/page", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["value"], "<html>");
}

#[tokio::test]
async fn test_lru_evicts_least_recently_used() {
    // Each entry below is 2 bytes; the budget holds two of them
    let state = test_state(Config {
        lru_max_bytes: 4,
        ..Config::default()
    });
    let app = create_router(state.clone());

    send(&app, "PUT", "/lru/add", Some(r#"{"key":"a","value":"1"}"#)).await;
    send(&app, "PUT", "/lru/add", Some(r#"{"key":"b","value":"2"}"#)).await;
    // Touch "a" so "b" becomes the eviction candidate
    send(&app, "GET", "/lru/get/a", None).await;
    send(&app, "PUT", "/lru/add", Some(r#"{"key":"c","value":"3"}"#)).await;

    let response = send(&app, "GET", "/lru/get/b", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&app, "GET", "/lru/get/a", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(state.lru.cur_bytes(), 4);
    assert_eq!(state.lru.stats().evictions, 1);
}

#[tokio::test]
async fn test_lru_delete_missing_key() {
    let app = create_test_app();

    let response = send(&app, "DELETE", "/lru/del/never", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["deleted"], false);
}

// == Validation Tests ==

#[tokio::test]
async fn test_empty_key_rejected() {
    let app = create_test_app();

    let response = send(&app, "PUT", "/lru/add", Some(r#"{"key":"","value":"v"}"#)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_long_key_rejected() {
    let app = create_test_app();
    let body = format!(r#"{{"key":"{}","value":"v"}}"#, "k".repeat(257));

    let response = send(&app, "PUT", "/ttl/set", Some(&body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_long_key_rejected_on_get() {
    let app = create_test_app();
    let key = "k".repeat(257);

    for prefix in ["/ttl/get/", "/lru/get/"] {
        let response = send(&app, "GET", &format!("{prefix}{key}"), None).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_to_json(response.into_body()).await;
        assert!(json["error"].as_str().unwrap().contains("256"));
    }
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = create_test_app();

    let response = send(&app, "PUT", "/ttl/set", Some(r#"{"key":"k""#)).await;

    assert!(response.status().is_client_error());
}

// == Diagnostics Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();

    send(&app, "PUT", "/lru/add", Some(r#"{"key":"k","value":"v"}"#)).await;
    send(&app, "GET", "/lru/get/k", None).await;
    send(&app, "GET", "/lru/get/missing", None).await;

    let response = send(&app, "GET", "/stats", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["lru"]["hits"], 1);
    assert_eq!(json["lru"]["misses"], 1);
    assert_eq!(json["lru"]["total_entries"], 1);
    assert_eq!(json["lru"]["hit_rate"], 0.5);
    assert_eq!(json["ttl"]["shard_count"], 16);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_cache_series() {
    let app = create_test_app();

    send(&app, "PUT", "/ttl/set", Some(r#"{"key":"k","value":"v"}"#)).await;
    send(&app, "PUT", "/lru/add", Some(r#"{"key":"k","value":"v"}"#)).await;

    let response = send(&app, "GET", "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = body_to_string(response.into_body()).await;
    assert!(text.contains("ttlcache_usage_seconds"));
    assert!(text.contains(r#"method="set""#));
    assert!(text.contains("cache_used_bytes 2"));
    assert!(text.contains("cache_total_bytes"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = send(&app, "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
