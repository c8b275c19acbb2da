//! Integration tests for AI summaries.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use pkl_monitor_integration_tests::{ADMIN_PASSWORD, SAMPLE_CSV, TestApp};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_analysis_sends_filtered_records() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    app.login("admin", ADMIN_PASSWORD).await;
    app.sync().await;

    let response = app
        .client
        .post(app.url("/api/analysis"))
        .json(&json!({ "prompt": "Ringkas", "district": "Baru" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["text"], "Relokasi berjalan baik.");
    assert_eq!(body["records"], 2);

    let request = app.upstream.with(|s| s.gemini_requests[0].clone());
    let system = request["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
    assert!(system.contains("Ibu Sari"));
    assert!(!system.contains("Bu Rina"));
    // Only summary fields leave the dashboard.
    assert!(!system.contains("Jl. Ahmad Yani"));
    assert_eq!(request["contents"][0]["parts"][0]["text"], "Ringkas");
}

#[tokio::test]
async fn test_analysis_scoped_and_default_prompt() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    app.login("losari", "losari").await;
    app.sync().await;

    let response = app
        .client
        .post(app.url("/api/analysis"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["records"], 2);

    let request = app.upstream.with(|s| s.gemini_requests[0].clone());
    assert_eq!(
        request["contents"][0]["parts"][0]["text"],
        "Berikan analisis ringkas tentang status relokasi PKL."
    );
}

#[tokio::test]
async fn test_analysis_disabled_without_key() {
    let app = TestApp::spawn_with(SAMPLE_CSV, &[("GEMINI_API_KEY", "")]).await;
    app.login("admin", ADMIN_PASSWORD).await;

    let response = app
        .client
        .post(app.url("/api/analysis"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
