//! AI summary from the command line.
//!
//! Unlike the dashboard, this surfaces Gemini errors instead of replacing
//! them with a fallback message.

use pkl_monitor_admin::config::{GeminiConfig, env_lookup};
use pkl_monitor_admin::gemini::{DEFAULT_PROMPT, GeminiClient};
use pkl_monitor_admin::services::{RecordQuery, query};
use pkl_monitor_core::StatusFilter;

use super::{CommandError, fetch_records, http_client, sheet_config};

/// Summarize the records matching the filter.
pub async fn analyze(
    prompt: Option<&str>,
    district: Option<String>,
    status: StatusFilter,
) -> Result<(), CommandError> {
    let config = sheet_config()?;
    let gemini_config = GeminiConfig::from_lookup(&env_lookup).ok_or(CommandError::GeminiDisabled)?;
    let gemini = GeminiClient::new(&gemini_config)?;

    let records = fetch_records(&http_client()?, &config).await?;
    let filter = RecordQuery {
        q: None,
        district,
        status,
    };
    let matches = query(&records, &filter);

    let prompt = prompt.map(str::trim).filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PROMPT);
    tracing::info!("Asking {} about {} records", gemini.model(), matches.len());

    let text = gemini.generate(&matches, prompt).await?;
    tracing::info!("{text}");
    Ok(())
}
