//! Integration tests for login, logout, and identity scoping.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use pkl_monitor_integration_tests::{ADMIN_PASSWORD, SAMPLE_CSV, TestApp};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_elevated_login_sees_every_district() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    let me = app.login("Admin", ADMIN_PASSWORD).await;
    assert_eq!(me["role"], "elevated");
    assert_eq!(me["display_name"], "admin");

    app.sync().await;
    let records = app.get_json("/api/records").await;
    assert_eq!(records["total"], 5);
}

#[tokio::test]
async fn test_scoped_login_sees_only_its_district() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    let me = app.login("losari", "losari").await;
    assert_eq!(me["role"], "scoped");
    assert_eq!(me["district"], "Losari");

    app.sync().await;
    let records = app.get_json("/api/records").await;
    assert_eq!(records["total"], 2);
    for record in records["records"].as_array().unwrap() {
        assert_eq!(record["district"].as_str().unwrap().trim().to_lowercase(), "losari");
    }

    // A district filter cannot widen the scope.
    let records = app.get_json("/api/records?district=Baru").await;
    assert_eq!(records["total"], 0);
}

#[tokio::test]
async fn test_district_login_ignores_case_and_spaces() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    let me = app.login("Pisang Selatan", "PISANGSELATAN").await;
    assert_eq!(me["district"], "Pisang Selatan");
}

#[tokio::test]
async fn test_rejected_login() {
    let app = TestApp::spawn(SAMPLE_CSV).await;

    for (username, password) in [
        ("admin", "wrong-password"),
        ("baru", "losari"),
        ("atlantis", "atlantis"),
        ("", ""),
    ] {
        let response = app
            .client
            .post(app.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{username}");
    }
    assert!(!app.state.is_polling().await);
}

#[tokio::test]
async fn test_logout_stops_polling() {
    let app = TestApp::spawn(SAMPLE_CSV).await;
    app.login("baru", "baru").await;
    assert!(app.state.is_polling().await);

    let response = app.client.post(app.url("/auth/logout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!app.state.is_polling().await);

    let response = app.client.get(app.url("/api/records")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
