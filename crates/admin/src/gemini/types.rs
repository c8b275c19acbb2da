//! Request and response bodies for `generateContent`.

use pkl_monitor_core::VendorRecord;
use serde::{Deserialize, Serialize};

/// Text part of a content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

/// One content block (a turn or the system instruction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A single-part content block.
    #[must_use]
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(String::from),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

/// Sampling settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
}

/// `generateContent` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// `generateContent` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// The fields of a record shared with the model.
///
/// Photos and addresses are never sent.
#[derive(Debug, Serialize)]
pub struct RecordSummary<'a> {
    pub id: &'a str,
    pub nama: &'a str,
    pub kelurahan: &'a str,
    pub status: &'static str,
    pub jenis: &'a str,
}

impl<'a> From<&'a VendorRecord> for RecordSummary<'a> {
    fn from(record: &'a VendorRecord) -> Self {
        Self {
            id: &record.id,
            nama: &record.vendor_name,
            kelurahan: &record.district,
            status: record.status.label(),
            jenis: &record.goods_type,
        }
    }
}
