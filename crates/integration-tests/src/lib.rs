//! Integration test harness for the PKL relocation monitor.
//!
//! Each test gets its own dashboard bound to an ephemeral port, pointed at
//! an in-process fake of the upstream services:
//!
//! - `GET  /pub`                 - published CSV export
//! - `POST /exec`                - Apps Script mutation endpoint
//! - `POST /gemini/models/{..}`  - Gemini `generateContent`
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pkl-monitor-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::indexing_slicing)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use pkl_monitor_admin::config::DashboardConfig;
use pkl_monitor_admin::routes;
use pkl_monitor_admin::state::AppState;
use reqwest::Client;
use serde_json::{Value, json};

/// Password of the elevated test login.
pub const ADMIN_PASSWORD: &str = "aB3$xY9!mK2@nL5#";

/// Header row of the published sheet.
pub const CSV_HEADER: &str =
    "ID,Tanggal,Nama,Kelurahan,Alamat,Jenis,Status,Foto Sebelum,Foto Sesudah,Riwayat";

/// Sheet with rows in three districts.
pub const SAMPLE_CSV: &str = "ID,Tanggal,Nama,Kelurahan,Alamat,Jenis,Status,Foto Sebelum,Foto Sesudah,Riwayat
1,2024-01-10,Ibu Sari,Baru,Jl. Ahmad Yani,Kopi,Sudah Relokasi,https://drive.google.com/file/d/abc123/view,,Ditegur
2,2024-01-11,Pak Budi,Baru,Jl. Sudirman,Gorengan,Belum Relokasi,,,
3,2024-01-12,Bu Rina,Losari,Jl. Pasar,Sayur,Belum Relokasi,,,
4,2024-01-12,Pak Joko,losari ,Jl. Pasar,Buah,Sudah Relokasi,,,
5,2024-01-13,Mbak Tini,Pisang Selatan,Jl. Kenari,Jamu,Belum Relokasi,,,";

/// Mutable state of the fake upstreams.
#[derive(Debug)]
pub struct UpstreamState {
    /// Body served from `/pub`.
    pub csv: String,
    /// Status served from `/pub`.
    pub csv_status: StatusCode,
    /// Number of CSV fetches served.
    pub csv_fetches: usize,
    /// Bodies posted to `/exec`, in arrival order.
    pub mutations: Vec<Value>,
    /// Text answered by the Gemini fake.
    pub gemini_text: String,
    /// Bodies posted to the Gemini fake.
    pub gemini_requests: Vec<Value>,
}

/// In-process fake of the sheet, Apps Script, and Gemini.
#[derive(Clone)]
pub struct FakeUpstream {
    pub addr: SocketAddr,
    state: Arc<Mutex<UpstreamState>>,
}

impl FakeUpstream {
    /// Start serving `csv` on an ephemeral port.
    pub async fn start(csv: &str) -> Self {
        let state = Arc::new(Mutex::new(UpstreamState {
            csv: csv.to_string(),
            csv_status: StatusCode::OK,
            csv_fetches: 0,
            mutations: Vec::new(),
            gemini_text: "Relokasi berjalan baik.".to_string(),
            gemini_requests: Vec::new(),
        }));

        let app = Router::new()
            .route("/pub", get(serve_csv))
            .route("/exec", post(record_mutation))
            .route("/gemini/models/{*rest}", post(answer_gemini))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Run `f` against the upstream state.
    pub fn with<R>(&self, f: impl FnOnce(&mut UpstreamState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Replace the published CSV.
    pub fn set_csv(&self, csv: &str) {
        self.with(|s| s.csv = csv.to_string());
    }

    /// Make `/pub` answer with `status`.
    pub fn set_csv_status(&self, status: StatusCode) {
        self.with(|s| s.csv_status = status);
    }

    #[must_use]
    pub fn mutations(&self) -> Vec<Value> {
        self.with(|s| s.mutations.clone())
    }

    #[must_use]
    pub fn csv_fetches(&self) -> usize {
        self.with(|s| s.csv_fetches)
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

async fn serve_csv(State(state): State<Arc<Mutex<UpstreamState>>>) -> impl IntoResponse {
    let mut state = state.lock().unwrap();
    state.csv_fetches += 1;
    (state.csv_status, state.csv.clone())
}

async fn record_mutation(
    State(state): State<Arc<Mutex<UpstreamState>>>,
    Json(body): Json<Value>,
) -> &'static str {
    state.lock().unwrap().mutations.push(body);
    "{\"status\":\"success\"}"
}

async fn answer_gemini(
    State(state): State<Arc<Mutex<UpstreamState>>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.gemini_requests.push(body);
    Json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": state.gemini_text }] } }]
    }))
}

/// A running dashboard and a cookie-keeping client for it.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub state: AppState,
    pub upstream: FakeUpstream,
}

impl TestApp {
    /// Start a dashboard over `csv` with AI summaries enabled.
    pub async fn spawn(csv: &str) -> Self {
        Self::spawn_with(csv, &[]).await
    }

    /// Start a dashboard with extra environment overrides.
    pub async fn spawn_with(csv: &str, overrides: &[(&str, &str)]) -> Self {
        let upstream = FakeUpstream::start(csv).await;

        let mut vars: HashMap<String, String> = HashMap::from([
            ("DASHBOARD_ADMIN_PASSWORD".to_string(), ADMIN_PASSWORD.to_string()),
            ("SHEET_CSV_URL".to_string(), upstream.url("/pub")),
            ("APPS_SCRIPT_URL".to_string(), upstream.url("/exec")),
            ("TARGET_SHEET_ID".to_string(), "sheet-test".to_string()),
            ("TARGET_FOLDER_ID".to_string(), "folder-test".to_string()),
            ("SYNC_INTERVAL_SECS".to_string(), "3600".to_string()),
            ("WRITE_REFRESH_DELAY_MS".to_string(), "50".to_string()),
            ("GEMINI_API_KEY".to_string(), "AIza-test".to_string()),
            ("GEMINI_API_BASE".to_string(), upstream.url("/gemini")),
        ]);
        for (k, v) in overrides {
            vars.insert((*k).to_string(), (*v).to_string());
        }
        let config = DashboardConfig::from_lookup(&move |key: &str| vars.get(key).cloned()).unwrap();
        let state = AppState::new(config).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = routes::router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder().cookie_store(true).build().unwrap();

        Self {
            base_url: format!("http://{addr}"),
            client,
            state,
            upstream,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Log in, panicking unless the dashboard accepts the credentials.
    pub async fn login(&self, username: &str, password: &str) -> Value {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "login as {username}");
        response.json().await.unwrap()
    }

    /// Force a foreground refresh and return the sync status.
    pub async fn sync(&self) -> Value {
        self.client
            .post(self.url("/api/sync"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.json().await.unwrap()
    }

    /// Poll `check` until it holds or `timeout` elapses.
    pub async fn wait_until(&self, timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check()
    }
}
