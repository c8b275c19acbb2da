//! Integration tests for the sync snapshot and its failure handling.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use pkl_monitor_integration_tests::{ADMIN_PASSWORD, CSV_HEADER, SAMPLE_CSV, TestApp};
use reqwest::StatusCode;

#[tokio::test]
async fn test_login_triggers_initial_sync() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    app.login("admin", ADMIN_PASSWORD).await;

    let upstream = app.upstream.clone();
    assert!(
        app.wait_until(Duration::from_secs(2), || upstream.csv_fetches() >= 1)
            .await
    );
}

#[tokio::test]
async fn test_failed_fetch_serves_stale_snapshot() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    app.login("admin", ADMIN_PASSWORD).await;

    let status = app.sync().await;
    assert_eq!(status["has_error"], false);
    assert_eq!(status["records"], 5);
    let synced_at = status["last_synced_at"].clone();
    assert!(!synced_at.is_null());

    app.upstream.set_csv_status(StatusCode::SERVICE_UNAVAILABLE);
    let status = app.sync().await;
    assert_eq!(status["has_error"], true);
    assert_eq!(status["records"], 5);
    assert_eq!(status["last_synced_at"], synced_at);

    let overview = app.get_json("/api/overview").await;
    assert_eq!(overview["total"], 5);

    app.upstream.set_csv_status(StatusCode::OK);
    let status = app.sync().await;
    assert_eq!(status["has_error"], false);
}

#[tokio::test]
async fn test_empty_sheet_keeps_snapshot() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    app.login("admin", ADMIN_PASSWORD).await;
    app.sync().await;

    app.upstream.set_csv(CSV_HEADER);
    let status = app.sync().await;
    assert_eq!(status["records"], 5);
    assert_eq!(status["has_error"], false);
}

#[tokio::test]
async fn test_malformed_rows_dropped() {
    let csv = format!("{CSV_HEADER}\n1,2024-01-10,Ibu Sari,Baru,Jl. A\n2,2024-01-10,Pak Budi\n\n");
    let app = TestApp::spawn(&csv).await;
    app.login("admin", ADMIN_PASSWORD).await;

    let status = app.sync().await;
    assert_eq!(status["records"], 1);
}

#[tokio::test]
async fn test_sync_status_requires_login() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    let response = app.client.get(app.url("/api/sync")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
