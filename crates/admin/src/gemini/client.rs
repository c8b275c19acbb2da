//! Gemini API client for AI summaries of the record list.

use std::sync::Arc;

use pkl_monitor_core::VendorRecord;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{error, instrument, warn};

use crate::config::GeminiConfig;

use super::error::{ApiErrorResponse, GeminiError};
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, RecordSummary,
};

const TEMPERATURE: f32 = 0.7;

/// Prompt used when the caller does not supply one.
pub const DEFAULT_PROMPT: &str = "Berikan analisis ringkas tentang status relokasi PKL.";

/// Returned when the model answered without any text.
pub const NO_TEXT_FALLBACK: &str = "Maaf, AI tidak memberikan respon teks.";

/// Returned when the request failed for any reason.
pub const ERROR_FALLBACK: &str =
    "Maaf, terjadi kesalahan saat melakukan analisis AI. Silakan coba lagi nanti.";

const SYSTEM_INSTRUCTION: &str = "Anda adalah seorang analis data perkotaan profesional untuk Pemerintah Kota. \
Tugas Anda adalah menganalisis data PKL (Pedagang Kaki Lima) berikut dan memberikan wawasan, \
rekomendasi, atau menjawab pertanyaan pengguna dengan gaya bahasa yang profesional dan informatif.";

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    model: String,
    endpoint: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.inner.model)
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::Unauthorized` if the API key is not a valid
    /// header value, or `GeminiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| GeminiError::Unauthorized("API key is not a valid header".to_string()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-goog-api-key", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                model: config.model.clone(),
                endpoint,
            }),
        })
    }

    /// Model this client talks to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Summarize `records` in answer to `prompt`.
    ///
    /// Never fails: an empty answer yields [`NO_TEXT_FALLBACK`] and any
    /// error yields [`ERROR_FALLBACK`].
    pub async fn analyze(&self, records: &[&VendorRecord], prompt: &str) -> String {
        match self.generate(records, prompt).await {
            Ok(text) => text,
            Err(GeminiError::EmptyResponse) => {
                warn!("Gemini returned no text");
                NO_TEXT_FALLBACK.to_string()
            }
            Err(e) => {
                error!(error = %e, "Gemini analysis failed");
                ERROR_FALLBACK.to_string()
            }
        }
    }

    /// Ask the model about `records` and return its text.
    ///
    /// Only id, name, district, status, and goods type of each record are sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API reports an error, or
    /// the answer contains no text.
    #[instrument(skip(self, records, prompt), fields(model = %self.inner.model, records = records.len()))]
    pub async fn generate(
        &self,
        records: &[&VendorRecord],
        prompt: &str,
    ) -> Result<String, GeminiError> {
        let summary: Vec<RecordSummary<'_>> =
            records.iter().map(|r| RecordSummary::from(*r)).collect();
        let data = serde_json::to_string(&summary)
            .map_err(|e| GeminiError::Parse(format!("Failed to serialize records: {e}")))?;

        let request = GenerateContentRequest {
            system_instruction: Content::text(
                None,
                format!("{SYSTEM_INSTRUCTION}\nData yang tersedia: {data}"),
            ),
            contents: vec![Content::text(Some("user"), prompt)],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))?;

        parsed.text().ok_or(GeminiError::EmptyResponse)
    }

    /// Handle an error status code.
    async fn handle_error_status(status: StatusCode, response: reqwest::Response) -> GeminiError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return GeminiError::RateLimited(retry_after);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return GeminiError::Unauthorized("API key rejected".to_string());
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => GeminiError::Api {
                    status: api_error.error.status,
                    message: api_error.error.message,
                },
                Err(_) => GeminiError::Api {
                    status: status.to_string(),
                    message: body,
                },
            },
            Err(e) => GeminiError::Http(e),
        }
    }
}
