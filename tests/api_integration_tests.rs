//! Integration Tests for the Admin API
//!
//! Tests the full request/response cycle for each monitoring endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use namespaced_cache::{
    api::create_router, cache::CacheManager, perf::PerformanceMonitor, AppState, Namespace,
};
use serde_json::Value;
use tower::ServiceExt;

const TOKEN: &str = "test-admin-token";

// == Helper Functions ==

fn create_test_state(admin_token: Option<&str>) -> AppState {
    AppState::new(
        Arc::new(CacheManager::default()),
        Arc::new(PerformanceMonitor::new()),
        admin_token.map(str::to_string),
    )
}

fn admin_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router(create_test_state(None));

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["uptime_secs"].is_u64());
    assert!(json.get("timestamp").is_some());
}

// == Admin Guard Tests ==

#[tokio::test]
async fn test_admin_routes_disabled_without_configured_token() {
    let app = create_router(create_test_state(None));

    for (method, uri) in [
        ("GET", "/metrics"),
        ("GET", "/cache"),
        ("POST", "/reset"),
        ("POST", "/cache/flush"),
    ] {
        let (status, json) = send(&app, admin_request(method, uri)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert!(json["error"].as_str().unwrap().contains("disabled"));
    }
}

#[tokio::test]
async fn test_admin_route_missing_token() {
    let app = create_router(create_test_state(Some(TOKEN)));

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/cache")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_admin_route_wrong_token() {
    let app = create_router(create_test_state(Some(TOKEN)));

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/cache")
            .header("authorization", "Bearer nope")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// == Cache Endpoint Tests ==

#[tokio::test]
async fn test_cache_stats_endpoint() {
    let state = create_test_state(Some(TOKEN));
    state.cache.set(Namespace::Content, "page:1", &"<p>hi</p>", None);
    state.cache.get(Namespace::Content, "page:1");
    state.cache.get(Namespace::Content, "page:2");
    let app = create_router(state);

    let (status, json) = send(&app, admin_request("GET", "/cache")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["operations"]["hits"], 1);
    assert_eq!(json["operations"]["misses"], 1);
    assert_eq!(json["operations"]["sets"], 1);
    assert_eq!(json["namespaces"]["content"]["keys"], 1);
    assert_eq!(json["namespaces"]["user"]["keys"], 0);
}

#[tokio::test]
async fn test_flush_endpoint_clears_every_namespace() {
    let state = create_test_state(Some(TOKEN));
    for namespace in Namespace::ALL {
        state.cache.set(namespace, "k", &1, None);
    }
    let cache = state.cache.clone();
    let app = create_router(state);

    let (status, json) = send(&app, admin_request("POST", "/cache/flush")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.get("message").is_some());
    assert_eq!(cache.get_stats().total_keys(), 0);
}

// == Metrics Endpoint Tests ==

#[tokio::test]
async fn test_metrics_endpoint_records_routes() {
    let app = create_router(create_test_state(Some(TOKEN)));

    send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let (status, json) = send(&app, admin_request("GET", "/metrics")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["routes"]["GET /health"]["count"], 1);
    assert!(json["cache"]["operations"].is_object());
    assert!(json["samples"].is_array());
}

#[tokio::test]
async fn test_reset_endpoint_clears_route_timings() {
    let app = create_router(create_test_state(Some(TOKEN)));

    send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let (status, _) = send(&app, admin_request("POST", "/reset")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, admin_request("GET", "/metrics")).await;
    assert!(json["routes"].get("GET /health").is_none());
}

// == Error Handling Tests ==

#[tokio::test]
async fn test_wrong_method_rejected() {
    let app = create_router(create_test_state(Some(TOKEN)));

    let (status, _) = send(&app, admin_request("GET", "/cache/flush")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
