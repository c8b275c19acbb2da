//! Gemini integration for AI summaries.
//!
//! Enabled only when `GEMINI_API_KEY` is set. The model receives a trimmed
//! JSON summary of the currently filtered records and a free-text prompt.

mod client;
mod error;
mod types;

pub use client::{DEFAULT_PROMPT, ERROR_FALLBACK, GeminiClient, NO_TEXT_FALLBACK};
pub use error::GeminiError;
pub use types::RecordSummary;
