//! Mutations through the Apps Script web app.
//!
//! The script endpoint does not return an answer the caller can rely on, so
//! every operation resolves to [`Dispatched`] as soon as the request left
//! without a local transport error. Whether the sheet actually changed only
//! becomes visible on the next refresh.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use pkl_monitor_core::RecordDraft;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, instrument};
use url::Url;

use super::error::DispatchFailed;
use crate::config::SheetConfig;

/// Operation kind carried in the `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationAction {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for MutationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

/// Proof that a mutation was handed to the transport.
///
/// Says nothing about whether the remote script applied it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Dispatched {
    pub action: MutationAction,
    /// Record id sent with the mutation (empty for a create without id).
    pub id: String,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    action: MutationAction,
    #[serde(rename = "targetSheetId")]
    target_sheet_id: &'a str,
    #[serde(rename = "targetFolderId")]
    target_folder_id: &'a str,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct RecordFields<'a> {
    id_pkl: &'a str,
    nama: &'a str,
    kelurahan: &'a str,
    alamat: &'a str,
    jenis: &'a str,
    status: &'static str,
    history: &'a str,
    #[serde(rename = "fotoBeforeBase64")]
    foto_before_base64: &'a str,
    #[serde(rename = "fotoAfterBase64")]
    foto_after_base64: &'a str,
}

impl<'a> From<&'a RecordDraft> for RecordFields<'a> {
    fn from(draft: &'a RecordDraft) -> Self {
        Self {
            id_pkl: &draft.id,
            nama: &draft.vendor_name,
            kelurahan: &draft.district,
            alamat: &draft.address,
            jenis: &draft.goods_type,
            status: draft.status.label(),
            history: &draft.remediation_history,
            foto_before_base64: draft.photo_before.as_deref().unwrap_or_default(),
            foto_after_base64: draft.photo_after.as_deref().unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct DeleteFields<'a> {
    id_pkl: &'a str,
}

/// Client for the Apps Script mutation endpoint.
#[derive(Debug, Clone)]
pub struct AppsScriptGateway {
    client: Client,
    endpoint: Url,
    target_sheet_id: String,
    target_folder_id: String,
}

impl AppsScriptGateway {
    /// Create a gateway from the sheet configuration.
    #[must_use]
    pub fn new(client: Client, config: &SheetConfig) -> Self {
        Self {
            client,
            endpoint: config.apps_script_url.clone(),
            target_sheet_id: config.target_sheet_id.clone(),
            target_folder_id: config.target_folder_id.clone(),
        }
    }

    /// Append a new record.
    ///
    /// # Errors
    ///
    /// Returns `DispatchFailed` if the request could not be sent.
    #[instrument(skip(self, draft), fields(id = %draft.id))]
    pub async fn create(&self, draft: &RecordDraft) -> Result<Dispatched, DispatchFailed> {
        self.dispatch(MutationAction::Create, &draft.id, RecordFields::from(draft))
            .await
    }

    /// Overwrite the record with `draft.id`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchFailed` if the request could not be sent.
    #[instrument(skip(self, draft), fields(id = %draft.id))]
    pub async fn update(&self, draft: &RecordDraft) -> Result<Dispatched, DispatchFailed> {
        self.dispatch(MutationAction::Update, &draft.id, RecordFields::from(draft))
            .await
    }

    /// Remove the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchFailed` if the request could not be sent.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Dispatched, DispatchFailed> {
        self.dispatch(MutationAction::Delete, id, DeleteFields { id_pkl: id })
            .await
    }

    async fn dispatch<T: Serialize + Send>(
        &self,
        action: MutationAction,
        id: &str,
        body: T,
    ) -> Result<Dispatched, DispatchFailed> {
        let envelope = Envelope {
            action,
            target_sheet_id: &self.target_sheet_id,
            target_folder_id: &self.target_folder_id,
            body,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&envelope)
            .send()
            .await
            .map_err(|source| {
                error!(%action, id, error = %source, "Mutation dispatch failed");
                DispatchFailed { action, source }
            })?;

        // The status is not a reliable outcome signal for this endpoint.
        debug!(%action, id, status = response.status().as_u16(), "Mutation dispatched");

        Ok(Dispatched {
            action,
            id: id.to_string(),
        })
    }
}

/// Encode a photo file as a `data:` URL for the upload fields.
///
/// The MIME type is guessed from the file extension.
#[must_use]
pub fn photo_data_url(bytes: &[u8], file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let mime = match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };

    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use pkl_monitor_core::RelocationStatus;
    use serde_json::Value;

    use super::*;

    type Captured = Arc<Mutex<Vec<Value>>>;

    async fn capture(State(captured): State<Captured>, Json(body): Json<Value>) -> &'static str {
        captured.lock().unwrap().push(body);
        "ok"
    }

    async fn fake_script() -> (SheetConfig, Captured) {
        let captured = Captured::default();
        let router = Router::new()
            .route("/exec", post(capture))
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = SheetConfig {
            csv_url: Url::parse(&format!("http://{addr}/pub")).unwrap(),
            apps_script_url: Url::parse(&format!("http://{addr}/exec")).unwrap(),
            target_sheet_id: "sheet-123".to_string(),
            target_folder_id: "folder-456".to_string(),
        };
        (config, captured)
    }

    fn draft() -> RecordDraft {
        RecordDraft {
            id: "42".to_string(),
            vendor_name: "Dg. Naba".to_string(),
            district: "Losari".to_string(),
            address: "Jl. Penghibur".to_string(),
            goods_type: "Pisang Epe".to_string(),
            status: RelocationStatus::Relocated,
            remediation_history: "Teguran 1".to_string(),
            photo_before: Some("data:image/png;base64,AAAA".to_string()),
            photo_after: None,
        }
    }

    #[tokio::test]
    async fn test_create_payload_shape() {
        let (config, captured) = fake_script().await;
        let gateway = AppsScriptGateway::new(Client::new(), &config);

        let dispatched = gateway.create(&draft()).await.unwrap();
        assert_eq!(dispatched.action, MutationAction::Create);

        let body = captured.lock().unwrap().pop().unwrap();
        assert_eq!(body["action"], "CREATE");
        assert_eq!(body["targetSheetId"], "sheet-123");
        assert_eq!(body["targetFolderId"], "folder-456");
        assert_eq!(body["id_pkl"], "42");
        assert_eq!(body["nama"], "Dg. Naba");
        assert_eq!(body["kelurahan"], "Losari");
        assert_eq!(body["status"], "Sudah Relokasi");
        assert_eq!(body["fotoBeforeBase64"], "data:image/png;base64,AAAA");
        assert_eq!(body["fotoAfterBase64"], "");
    }

    #[tokio::test]
    async fn test_delete_carries_only_id() {
        let (config, captured) = fake_script().await;
        let gateway = AppsScriptGateway::new(Client::new(), &config);

        gateway.delete("42").await.unwrap();

        let body = captured.lock().unwrap().pop().unwrap();
        let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(body["action"], "DELETE");
        assert_eq!(body["id_pkl"], "42");
        assert_eq!(keys.len(), 4);
        assert!(body.get("nama").is_none());
    }

    #[tokio::test]
    async fn test_remote_error_status_still_dispatched() {
        let router = Router::new().route(
            "/exec",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "script error") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let (mut config, _) = fake_script().await;
        config.apps_script_url = Url::parse(&format!("http://{addr}/exec")).unwrap();
        let gateway = AppsScriptGateway::new(Client::new(), &config);

        assert!(gateway.update(&draft()).await.is_ok());
    }

    #[tokio::test]
    async fn test_transport_error_is_dispatch_failed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let (mut config, _) = fake_script().await;
        config.apps_script_url = Url::parse(&format!("http://{addr}/exec")).unwrap();
        let gateway = AppsScriptGateway::new(Client::new(), &config);

        let err = gateway.delete("42").await.unwrap_err();
        assert_eq!(err.action, MutationAction::Delete);
    }

    #[test]
    fn test_photo_data_url_mime_by_extension() {
        assert_eq!(photo_data_url(b"abc", "before.JPG"), "data:image/jpeg;base64,YWJj");
        assert!(photo_data_url(b"abc", "a.png").starts_with("data:image/png;base64,"));
        assert!(photo_data_url(b"abc", "a.webp").starts_with("data:image/webp;base64,"));
        assert!(
            photo_data_url(b"abc", "scan.heic").starts_with("data:application/octet-stream;base64,")
        );
        assert!(photo_data_url(b"abc", "noext").starts_with("data:application/octet-stream"));
    }
}
