//! Vendor records and the draft shape used for create/update.

use serde::{Deserialize, Serialize};

use super::district::district_key;
use super::status::RelocationStatus;

/// History text used when the spreadsheet cell is empty.
pub const NO_HISTORY_PLACEHOLDER: &str = "Tidak ada catatan";

/// One tracked street vendor (PKL) and its relocation status.
///
/// All text fields are always present; a missing cell becomes an empty
/// string. `id` is assigned by the spreadsheet and is not checked for
/// uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRecord {
    pub id: String,
    /// Free-form date as entered in the sheet.
    pub record_date: String,
    pub vendor_name: String,
    pub district: String,
    pub address: String,
    pub goods_type: String,
    pub status: RelocationStatus,
    /// Embeddable photo URL, empty when absent.
    pub photo_before: String,
    /// Embeddable photo URL, empty when absent.
    pub photo_after: String,
    pub remediation_history: String,
}

impl VendorRecord {
    /// Comparison key of this record's district.
    #[must_use]
    pub fn district_key(&self) -> String {
        district_key(&self.district)
    }

    /// District name trimmed for display and grouping.
    #[must_use]
    pub fn district_name(&self) -> &str {
        self.district.trim()
    }
}

/// Record contents submitted from the dashboard form.
///
/// Photos are data URLs (`data:image/jpeg;base64,...`). `None` leaves the
/// stored photo untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Required for updates; empty on create lets the sheet assign one.
    #[serde(default)]
    pub id: String,
    pub vendor_name: String,
    pub district: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub goods_type: String,
    #[serde(default)]
    pub status: RelocationStatus,
    #[serde(default)]
    pub remediation_history: String,
    #[serde(default)]
    pub photo_before: Option<String>,
    #[serde(default)]
    pub photo_after: Option<String>,
}

/// Form values for editing `record`.
///
/// The read-side [`NO_HISTORY_PLACEHOLDER`] becomes an empty history so it
/// is not written back as real text.
impl From<&VendorRecord> for RecordDraft {
    fn from(record: &VendorRecord) -> Self {
        let remediation_history = if record.remediation_history == NO_HISTORY_PLACEHOLDER {
            String::new()
        } else {
            record.remediation_history.clone()
        };

        Self {
            id: record.id.clone(),
            vendor_name: record.vendor_name.clone(),
            district: record.district.clone(),
            address: record.address.clone(),
            goods_type: record.goods_type.clone(),
            status: record.status,
            remediation_history,
            photo_before: None,
            photo_after: None,
        }
    }
}
