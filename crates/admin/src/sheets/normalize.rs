//! Rows of the sheet export to [`VendorRecord`]s.
//!
//! Column order: id, date, name, district, address, goods type, status,
//! photo before, photo after, history. Columns past the tenth are ignored.

use pkl_monitor_core::{NO_HISTORY_PLACEHOLDER, RelocationStatus, VendorRecord};

use super::csv::{clean_field, split_lines, split_row};
use super::drive;

/// Rows with fewer fields than this are dropped as incomplete.
pub const MIN_FIELDS: usize = 5;

/// Result of parsing a whole export.
#[derive(Debug, Default)]
pub struct ParsedSheet {
    /// Records in sheet order.
    pub records: Vec<VendorRecord>,
    /// 1-based line numbers of dropped rows.
    pub malformed_lines: Vec<usize>,
}

/// Parse export text: header discarded, blank lines skipped.
#[must_use]
pub fn parse_sheet(text: &str) -> ParsedSheet {
    let mut parsed = ParsedSheet::default();

    for (index, line) in split_lines(text).enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_row(&split_row(line)) {
            Some(record) => parsed.records.push(record),
            None => parsed.malformed_lines.push(index + 1),
        }
    }

    parsed
}

/// Build a record from raw fields of one row.
///
/// Returns `None` for rows with fewer than [`MIN_FIELDS`] fields.
#[must_use]
pub fn parse_row(fields: &[&str]) -> Option<VendorRecord> {
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let field = |i: usize| fields.get(i).map(|raw| clean_field(raw)).unwrap_or_default();

    let remediation_history = field(9);
    let remediation_history = if remediation_history.is_empty() {
        NO_HISTORY_PLACEHOLDER.to_string()
    } else {
        remediation_history
    };

    Some(VendorRecord {
        id: field(0),
        record_date: field(1),
        vendor_name: field(2),
        district: field(3),
        address: field(4),
        goods_type: field(5),
        status: RelocationStatus::from_cell(&field(6)),
        photo_before: drive::rewrite(&field(7)),
        photo_after: drive::rewrite(&field(8)),
        remediation_history,
    })
}
