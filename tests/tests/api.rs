//! Router tests against in-memory source and store.
//!
//! No Docker needed.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{fixtures, setup::MockContext};
use std::sync::Arc;
use std::time::Duration;

fn server(ctx: &MockContext) -> TestServer {
    TestServer::new(ctx.router.clone()).expect("Failed to create test server")
}

#[tokio::test]
async fn test_healthz_shape() {
    let ctx = MockContext::new();
    let server = server(&ctx);

    let response = server.get("/healthz").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"]["app"], "ingestor");
    assert_eq!(body["status"]["status"], "ok");
    assert!(body["status"]["startedAt"].is_string());
}

#[tokio::test]
async fn test_ingest_then_recent_page() {
    let ctx = MockContext::new();
    ctx.source.set_records(fixtures::raw_records(8));
    let server = server(&ctx);

    let response = server.post("/ingest").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ingested"], 8);
    assert_eq!(ctx.store.len(), 8);

    let response = server.get("/posts").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["limit"], 50);
    assert_eq!(body["offset"], 0);

    // Same instant for the whole run, so ids descend.
    let ids: Vec<i64> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![8, 7, 6, 5, 4, 3, 2, 1]);
    assert_eq!(body["items"][0]["ingested_at"], "2025-08-17T04:41:12Z");
}

#[tokio::test]
async fn test_posts_by_user() {
    let ctx = MockContext::new();
    ctx.source.set_records(vec![
        fixtures::raw_record(7, 30),
        fixtures::raw_record(7, 10),
        fixtures::raw_record(8, 20),
    ]);
    ctx.service.run_once().await.unwrap();
    let server = server(&ctx);

    let response = server.get("/posts").add_query_param("userId", 7).await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let ids: Vec<i64> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![10, 30]);

    let response = server.get("/posts").add_query_param("userId", 99).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["items"], serde_json::json!([]));
}

#[tokio::test]
async fn test_posts_invalid_user_id() {
    let ctx = MockContext::new();
    let server = server(&ctx);

    let response = server.get("/posts").add_query_param("userId", "abc").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
    assert_eq!(body["error"], "invalid userId");
}

#[tokio::test]
async fn test_posts_bad_paging_falls_back() {
    let ctx = MockContext::new();
    let server = server(&ctx);

    let response = server
        .get("/posts")
        .add_query_param("limit", "lots")
        .add_query_param("offset", "x")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["limit"], 50);
    assert_eq!(body["offset"], 0);
}

#[tokio::test]
async fn test_posts_out_of_range_paging_is_clamped_by_store() {
    let ctx = MockContext::new();
    ctx.source.set_records(fixtures::raw_records(3));
    ctx.service.run_once().await.unwrap();
    let server = server(&ctx);

    let response = server
        .get("/posts")
        .add_query_param("limit", 0)
        .add_query_param("offset", -5)
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_posts_store_failure() {
    let ctx = MockContext::new();
    ctx.store.set_fail_reads(true);
    let server = server(&ctx);

    let response = server.get("/posts").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "DB_002");
    assert!(body["error"].as_str().unwrap().starts_with("query error"));
}

#[tokio::test]
async fn test_posts_deadline() {
    let ctx = MockContext::with_timeouts(Duration::from_millis(50), Duration::from_secs(30));
    ctx.store.set_read_delay(Some(Duration::from_secs(5)));
    let server = server(&ctx);

    let response = server.get("/posts").add_query_param("userId", 1).await;
    response.assert_status(StatusCode::GATEWAY_TIMEOUT);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "TIMEOUT_001");
}

#[tokio::test]
async fn test_ingest_upstream_failure() {
    let ctx = MockContext::new();
    ctx.source.set_should_fail(true);
    let server = server(&ctx);

    let response = server.post("/ingest").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "SRC_002");
    assert_eq!(ctx.store.upsert_count(), 0);
}

#[tokio::test]
async fn test_ingest_store_failure() {
    let ctx = MockContext::new();
    ctx.source.set_records(fixtures::raw_records(2));
    ctx.store.set_fail_writes(true);
    let server = server(&ctx);

    let response = server.post("/ingest").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "DB_001");
    assert!(ctx.store.is_empty());
}

#[tokio::test]
async fn test_ingest_twice_keeps_one_record_per_key() {
    let ctx = MockContext::new();
    ctx.source.set_records(fixtures::raw_records(5));
    let server = server(&ctx);

    server.post("/ingest").await.assert_status_ok();
    server.post("/ingest").await.assert_status_ok();

    assert_eq!(ctx.store.len(), 5);
    assert_eq!(ctx.store.upsert_count(), 2);
    assert_eq!(ctx.source.fetch_count(), 2);
}

#[tokio::test]
async fn test_ingest_normalises_clock_offset() {
    let ctx = MockContext::with_clock(Arc::new(fixtures::ist_clock));
    ctx.source.set_records(vec![fixtures::raw_record(1, 1)]);

    let report = ctx.service.run_once().await.unwrap();
    assert_eq!(report.count, 1);

    let stored = ctx.service.query_by_owner(1).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].ingested_at, fixtures::t0());

    let body: serde_json::Value = server(&ctx)
        .get("/posts")
        .add_query_param("userId", 1)
        .await
        .json();
    assert_eq!(body["items"][0]["ingested_at"], "2025-08-17T04:41:12Z");
}
