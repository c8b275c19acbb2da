//! Relocation status and the list filter built on it.

use serde::{Deserialize, Serialize};

/// Relocation status of a vendor.
///
/// Closed two-value enum. The spreadsheet stores the Indonesian labels
/// (`Sudah Relokasi` / `Belum Relokasi`); anything unrecognized is
/// [`RelocationStatus::NotRelocated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelocationStatus {
    /// The vendor has been moved to the designated location.
    Relocated,
    /// The vendor still trades at the original spot.
    #[default]
    NotRelocated,
}

impl RelocationStatus {
    /// Spreadsheet label for a relocated vendor.
    pub const RELOCATED_LABEL: &'static str = "Sudah Relokasi";
    /// Spreadsheet label for a vendor not yet relocated.
    pub const NOT_RELOCATED_LABEL: &'static str = "Belum Relokasi";

    /// Coerce a raw cell value into the closed enum.
    ///
    /// Accepts the spreadsheet labels and the English names, ignoring case
    /// and surrounding whitespace. Any other value, including the empty
    /// string, is `NotRelocated`.
    #[must_use]
    pub fn from_cell(raw: &str) -> Self {
        let value = raw.trim();
        if value.eq_ignore_ascii_case(Self::RELOCATED_LABEL) || value.eq_ignore_ascii_case("relocated")
        {
            Self::Relocated
        } else {
            Self::NotRelocated
        }
    }

    /// Label written to and read from the spreadsheet.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relocated => Self::RELOCATED_LABEL,
            Self::NotRelocated => Self::NOT_RELOCATED_LABEL,
        }
    }

    /// Returns `true` for [`RelocationStatus::Relocated`].
    #[must_use]
    pub const fn is_relocated(self) -> bool {
        matches!(self, Self::Relocated)
    }
}

impl std::fmt::Display for RelocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Status selection for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// No status restriction.
    #[default]
    All,
    /// Only relocated vendors.
    Relocated,
    /// Only vendors not yet relocated.
    NotRelocated,
}

impl StatusFilter {
    /// Whether a record with `status` passes this filter.
    #[must_use]
    pub const fn admits(self, status: RelocationStatus) -> bool {
        match self {
            Self::All => true,
            Self::Relocated => matches!(status, RelocationStatus::Relocated),
            Self::NotRelocated => matches!(status, RelocationStatus::NotRelocated),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "relocated" => Ok(Self::Relocated),
            "not_relocated" => Ok(Self::NotRelocated),
            _ => Err(format!("invalid status filter: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cell_relocated_label() {
        assert_eq!(
            RelocationStatus::from_cell("Sudah Relokasi"),
            RelocationStatus::Relocated
        );
        assert_eq!(
            RelocationStatus::from_cell("  sudah relokasi "),
            RelocationStatus::Relocated
        );
        assert_eq!(
            RelocationStatus::from_cell("Relocated"),
            RelocationStatus::Relocated
        );
    }

    #[test]
    fn test_from_cell_everything_else_is_not_relocated() {
        for raw in ["Belum Relokasi", "", "Sudah", "pending", "Sudah Relokasi!"] {
            assert_eq!(
                RelocationStatus::from_cell(raw),
                RelocationStatus::NotRelocated,
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_label_matches_sheet_literals() {
        assert_eq!(RelocationStatus::Relocated.label(), "Sudah Relokasi");
        assert_eq!(RelocationStatus::NotRelocated.to_string(), "Belum Relokasi");
    }

    #[test]
    fn test_status_filter_admits() {
        assert!(StatusFilter::All.admits(RelocationStatus::Relocated));
        assert!(StatusFilter::All.admits(RelocationStatus::NotRelocated));
        assert!(StatusFilter::Relocated.admits(RelocationStatus::Relocated));
        assert!(!StatusFilter::Relocated.admits(RelocationStatus::NotRelocated));
        assert!(!StatusFilter::NotRelocated.admits(RelocationStatus::Relocated));
    }

    #[test]
    fn test_status_filter_from_str() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "not_relocated".parse::<StatusFilter>(),
            Ok(StatusFilter::NotRelocated)
        );
        assert!("Sudah Relokasi".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&RelocationStatus::NotRelocated).unwrap_or_default();
        assert_eq!(json, "\"not_relocated\"");
        let filter: StatusFilter = serde_json::from_str("\"relocated\"").unwrap_or_default();
        assert_eq!(filter, StatusFilter::Relocated);
    }
}
