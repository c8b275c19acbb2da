//! Record mutations through the Apps Script endpoint.
//!
//! # Usage
//!
//! ```bash
//! # Create a record
//! pkl-cli create --name "Ibu Sari" --district Baru --goods-type Kopi
//!
//! # Mark a record relocated and attach an after photo
//! pkl-cli update --id 12 --status "Sudah Relokasi" --photo-after after.jpg
//!
//! # Delete a record
//! pkl-cli delete 12
//! ```
//!
//! The script does not report whether it applied the change. Run
//! `pkl-cli list` after a few seconds to confirm.

use std::path::{Path, PathBuf};

use pkl_monitor_admin::sheets::{AppsScriptGateway, photo_data_url};
use pkl_monitor_core::{RecordDraft, RelocationStatus};

use super::{CommandError, fetch_records, http_client, sheet_config};

/// Field values given on the command line. `None` means not given.
#[derive(Debug, Default, Clone)]
pub struct RecordFields {
    pub name: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub goods_type: Option<String>,
    pub status: Option<String>,
    pub history: Option<String>,
    pub photo_before: Option<PathBuf>,
    pub photo_after: Option<PathBuf>,
}

impl RecordFields {
    /// Overlay the given fields onto `draft`.
    async fn apply(self, draft: &mut RecordDraft) -> Result<(), CommandError> {
        if let Some(name) = self.name {
            draft.vendor_name = name;
        }
        if let Some(district) = self.district {
            draft.district = district;
        }
        if let Some(address) = self.address {
            draft.address = address;
        }
        if let Some(goods_type) = self.goods_type {
            draft.goods_type = goods_type;
        }
        if let Some(status) = self.status {
            draft.status = RelocationStatus::from_cell(&status);
        }
        if let Some(history) = self.history {
            draft.remediation_history = history;
        }
        if let Some(path) = self.photo_before {
            draft.photo_before = Some(read_photo(&path).await?);
        }
        if let Some(path) = self.photo_after {
            draft.photo_after = Some(read_photo(&path).await?);
        }
        Ok(())
    }
}

async fn read_photo(path: &Path) -> Result<String, CommandError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CommandError::Photo {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    Ok(photo_data_url(&bytes, file_name))
}

/// Create a record. `--name` and `--district` are required.
pub async fn create(fields: RecordFields) -> Result<(), CommandError> {
    if fields.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        return Err(CommandError::MissingField("name"));
    }
    if fields.district.as_deref().is_none_or(|d| d.trim().is_empty()) {
        return Err(CommandError::MissingField("district"));
    }

    let mut draft = RecordDraft {
        id: String::new(),
        vendor_name: String::new(),
        district: String::new(),
        address: String::new(),
        goods_type: String::new(),
        status: RelocationStatus::NotRelocated,
        remediation_history: String::new(),
        photo_before: None,
        photo_after: None,
    };
    fields.apply(&mut draft).await?;

    let config = sheet_config()?;
    let gateway = AppsScriptGateway::new(http_client()?, &config);
    let dispatched = gateway.create(&draft).await?;

    tracing::info!(
        "{} dispatched for {} ({})",
        dispatched.action,
        draft.vendor_name,
        draft.district
    );
    Ok(())
}

/// Update record `id`. Fields not given keep their current sheet values.
pub async fn update(id: &str, fields: RecordFields) -> Result<(), CommandError> {
    let config = sheet_config()?;
    let client = http_client()?;

    let records = fetch_records(&client, &config).await?;
    let current = records
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| CommandError::NotFound(id.to_owned()))?;

    let mut draft = RecordDraft::from(current);
    fields.apply(&mut draft).await?;

    let gateway = AppsScriptGateway::new(client, &config);
    let dispatched = gateway.update(&draft).await?;

    tracing::info!("{} dispatched for record {}", dispatched.action, dispatched.id);
    Ok(())
}

/// Delete record `id`.
pub async fn delete(id: &str) -> Result<(), CommandError> {
    let config = sheet_config()?;
    let gateway = AppsScriptGateway::new(http_client()?, &config);
    let dispatched = gateway.delete(id).await?;

    tracing::info!("{} dispatched for record {}", dispatched.action, dispatched.id);
    Ok(())
}
