//! Filtering and per-district rollups over a scoped record set.
//!
//! Everything here is a pure function of its input and is recomputed on
//! every request.

use std::collections::HashMap;

use pkl_monitor_core::{StatusFilter, VendorRecord, district_key};
use serde::{Deserialize, Serialize};

/// Group name for records with an empty district.
pub const UNKNOWN_DISTRICT: &str = "Unknown";

/// List filter as sent by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecordQuery {
    /// Case-insensitive substring of vendor name, district, or id.
    pub q: Option<String>,
    /// District to restrict to; empty means no restriction.
    pub district: Option<String>,
    pub status: StatusFilter,
}

impl RecordQuery {
    fn search(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    fn district_key(&self) -> Option<String> {
        self.district
            .as_deref()
            .map(district_key)
            .filter(|key| !key.is_empty())
    }
}

/// Records matching every condition of `query`, in input order.
#[must_use]
pub fn query<'a, I>(records: I, query: &RecordQuery) -> Vec<&'a VendorRecord>
where
    I: IntoIterator<Item = &'a VendorRecord>,
{
    let search = query.search();
    let district = query.district_key();

    records
        .into_iter()
        .filter(|record| {
            search.as_deref().is_none_or(|needle| {
                record.vendor_name.to_lowercase().contains(needle)
                    || record.district.to_lowercase().contains(needle)
                    || record.id.to_lowercase().contains(needle)
            })
        })
        .filter(|record| {
            district
                .as_deref()
                .is_none_or(|key| record.district_key() == key)
        })
        .filter(|record| query.status.admits(record.status))
        .collect()
}

/// Status counts for one group of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DistrictTally {
    pub total: usize,
    pub relocated: usize,
    pub not_relocated: usize,
}

impl DistrictTally {
    fn add(&mut self, record: &VendorRecord) {
        self.total += 1;
        if record.status.is_relocated() {
            self.relocated += 1;
        } else {
            self.not_relocated += 1;
        }
    }

    /// Relocated share as a whole percentage, rounded half up.
    ///
    /// Zero when the group is empty.
    #[must_use]
    pub const fn percentage(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            (self.relocated * 200 + self.total) / (self.total * 2)
        }
    }
}

/// One row of the per-district table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictRollup {
    /// District as first spelled in the input, trimmed.
    pub name: String,
    pub total: usize,
    pub relocated: usize,
    pub not_relocated: usize,
    pub percentage: usize,
}

/// Overall counts plus the per-district table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rollup {
    pub total: usize,
    pub relocated: usize,
    pub not_relocated: usize,
    /// Largest district first; equal totals keep first-seen order.
    pub per_district: Vec<DistrictRollup>,
}

/// Aggregate `records` overall and per district.
///
/// Districts are grouped by [`district_key`], so spellings that differ
/// only in case or whitespace share one row.
#[must_use]
pub fn aggregate<'a, I>(records: I) -> Rollup
where
    I: IntoIterator<Item = &'a VendorRecord>,
{
    let mut overall = DistrictTally::default();
    let mut groups: Vec<(String, DistrictTally)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        overall.add(record);

        let key = record.district_key();
        let slot = *index.entry(key).or_insert_with(|| {
            let name = match record.district_name() {
                "" => UNKNOWN_DISTRICT.to_string(),
                name => name.to_string(),
            };
            groups.push((name, DistrictTally::default()));
            groups.len() - 1
        });
        if let Some((_, tally)) = groups.get_mut(slot) {
            tally.add(record);
        }
    }

    let mut per_district: Vec<DistrictRollup> = groups
        .into_iter()
        .map(|(name, tally)| DistrictRollup {
            name,
            total: tally.total,
            relocated: tally.relocated,
            not_relocated: tally.not_relocated,
            percentage: tally.percentage(),
        })
        .collect();
    per_district.sort_by(|a, b| b.total.cmp(&a.total));

    Rollup {
        total: overall.total,
        relocated: overall.relocated,
        not_relocated: overall.not_relocated,
        per_district,
    }
}

/// Counts for the single district `name`.
#[must_use]
pub fn district_detail<'a, I>(records: I, name: &str) -> DistrictTally
where
    I: IntoIterator<Item = &'a VendorRecord>,
{
    let key = district_key(name);
    let mut tally = DistrictTally::default();
    for record in records.into_iter().filter(|r| r.district_key() == key) {
        tally.add(record);
    }
    tally
}
