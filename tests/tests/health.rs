//! Tests for health check endpoints.
//!
//! The health registry is process-global, so everything that flips component
//! state lives in one test.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::setup::MockContext;
use telemetry::health;

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = MockContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    let status = body["status"].as_str().unwrap_or("");
    assert!(
        status == "healthy" || status == "degraded" || status == "unhealthy",
        "Status should be 'healthy', 'degraded', or 'unhealthy', got '{}'",
        status
    );

    let names: Vec<&str> = body["components"]
        .as_array()
        .expect("components should be an array")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(names.contains(&"upstream"));
    assert!(names.contains(&"clickhouse"));

    assert!(body["metrics"]["runs_started"].is_u64());
}

/// Test /health/live always reports alive
#[tokio::test]
async fn test_liveness() {
    let ctx = MockContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server.get("/health/live").await.assert_status(StatusCode::OK);
}

/// Readiness follows ClickHouse; overall status follows both components.
#[tokio::test]
async fn test_readiness_and_status_follow_components() {
    let ctx = MockContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    health().clickhouse.set_unhealthy("Connection failed");
    server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["status"], "unhealthy");

    health().clickhouse.set_healthy();
    health().upstream.set_unhealthy("upstream returned 502");
    server.get("/health/ready").await.assert_status(StatusCode::OK);
    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["status"], "degraded");

    health().upstream.set_healthy();
    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["status"], "healthy");
}

/// /healthz does not depend on component state.
#[tokio::test]
async fn test_healthz_is_static() {
    let ctx = MockContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let first: serde_json::Value = server.get("/healthz").await.json();
    let second: serde_json::Value = server.get("/healthz").await.json();

    assert_eq!(first, second);
    assert_eq!(first["status"]["status"], "ok");
}
