//! Read-only commands over the published sheet.
//!
//! # Usage
//!
//! ```bash
//! # Per-district relocation progress
//! pkl-cli fetch
//!
//! # Progress for one district
//! pkl-cli fetch --district "Pisang Selatan"
//!
//! # Search records
//! pkl-cli list -q kopi --status not_relocated
//! ```

use pkl_monitor_admin::services::{RecordQuery, aggregate, district_detail, query};
use pkl_monitor_core::StatusFilter;

use super::{CommandError, fetch_records, http_client, sheet_config};

/// Fetch the sheet and log the rollup.
pub async fn fetch(district: Option<&str>) -> Result<(), CommandError> {
    let config = sheet_config()?;
    let client = http_client()?;
    let records = fetch_records(&client, &config).await?;

    if let Some(name) = district {
        let tally = district_detail(&records, name);
        tracing::info!(
            "{}: {} / {} relocated ({}%), {} remaining",
            name.trim(),
            tally.relocated,
            tally.total,
            tally.percentage(),
            tally.not_relocated
        );
        return Ok(());
    }

    let rollup = aggregate(&records);
    tracing::info!(
        "{} records: {} relocated, {} not relocated",
        rollup.total,
        rollup.relocated,
        rollup.not_relocated
    );
    for row in &rollup.per_district {
        tracing::info!(
            "  {:<20} {:>4} total {:>4} relocated {:>3}%",
            row.name,
            row.total,
            row.relocated,
            row.percentage
        );
    }
    Ok(())
}

/// Fetch the sheet and log matching records.
pub async fn list(
    q: Option<String>,
    district: Option<String>,
    status: StatusFilter,
    json: bool,
) -> Result<(), CommandError> {
    let config = sheet_config()?;
    let client = http_client()?;
    let records = fetch_records(&client, &config).await?;

    let filter = RecordQuery { q, district, status };
    let matches = query(&records, &filter);

    if json {
        let body = serde_json::to_string_pretty(&matches).unwrap_or_default();
        tracing::info!("{body}");
        return Ok(());
    }

    for record in &matches {
        tracing::info!(
            "{:>5}  {:<24} {:<16} {}",
            record.id,
            record.vendor_name,
            record.district_name(),
            record.status
        );
    }
    tracing::info!("{} of {} records", matches.len(), records.len());
    Ok(())
}
