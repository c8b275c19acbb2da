//! Subcommand implementations.
//!
//! Each command loads only the configuration it needs, so `fetch` and
//! `list` work without the dashboard password or a Gemini key.

pub mod analyze;
pub mod records;
pub mod write;

use std::path::PathBuf;

use pkl_monitor_admin::config::{ConfigError, SheetConfig, env_lookup};
use pkl_monitor_admin::gemini::GeminiError;
use pkl_monitor_admin::sheets::{DispatchFailed, RecordSource, SheetSource, SourceError};
use pkl_monitor_core::VendorRecord;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Sheet fetch failed: {0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Dispatch(#[from] DispatchFailed),

    #[error("Gemini error: {0}")]
    Gemini(#[from] GeminiError),

    /// `GEMINI_API_KEY` is not set.
    #[error("GEMINI_API_KEY is not set")]
    GeminiDisabled,

    #[error("Missing required option: --{0}")]
    MissingField(&'static str),

    #[error("No record with id {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Photo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load `.env` and the sheet endpoints.
fn sheet_config() -> Result<SheetConfig, CommandError> {
    dotenvy::dotenv().ok();
    Ok(SheetConfig::from_lookup(&env_lookup)?)
}

fn http_client() -> Result<reqwest::Client, CommandError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("pkl-cli/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Fetch the current sheet contents.
async fn fetch_records(
    client: &reqwest::Client,
    config: &SheetConfig,
) -> Result<Vec<VendorRecord>, CommandError> {
    tracing::info!("Fetching {}", config.csv_url);
    let source = SheetSource::new(client.clone(), config.csv_url.clone());
    Ok(source.fetch_all().await?)
}
