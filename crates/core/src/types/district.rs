//! Districts (kelurahan) covered by the dashboard.
//!
//! District values coming from the spreadsheet are free text. Every
//! comparison goes through [`district_key`], which ignores case and all
//! whitespace, so `" Losari "`, `"losari"` and `"LOSARI"` are one district.
//! Spellings outside [`DISTRICTS`] are accepted and kept as their own group.

/// The fixed district enumeration, in display order.
pub const DISTRICTS: [&str; 10] = [
    "Baru",
    "Bulogading",
    "Lae-Lae",
    "Lajangiru",
    "Losari",
    "Maloku",
    "Mangkura",
    "Pisang Selatan",
    "Pisang Utara",
    "Sawerigading",
];

/// District pre-selected for a new record.
pub const DEFAULT_DISTRICT: &str = DISTRICTS[0];

/// Comparison key for a district name: lower-cased, whitespace removed.
#[must_use]
pub fn district_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether two district spellings denote the same district.
#[must_use]
pub fn same_district(a: &str, b: &str) -> bool {
    district_key(a) == district_key(b)
}

/// Canonical spelling for `name`, if it is one of [`DISTRICTS`].
#[must_use]
pub fn canonical_district(name: &str) -> Option<&'static str> {
    let key = district_key(name);
    DISTRICTS.into_iter().find(|d| district_key(d) == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_district_key_ignores_case_and_whitespace() {
        assert_eq!(district_key(" Losari "), "losari");
        assert_eq!(district_key("losari"), "losari");
        assert_eq!(district_key("Pisang  Selatan"), district_key("pisangselatan"));
    }

    #[test]
    fn test_same_district() {
        assert!(same_district(" Losari ", "losari"));
        assert!(same_district("LAE-LAE", "Lae-Lae"));
        assert!(!same_district("Losari", "Maloku"));
    }

    #[test]
    fn test_canonical_district() {
        assert_eq!(canonical_district("pisang utara"), Some("Pisang Utara"));
        assert_eq!(canonical_district(" BARU"), Some("Baru"));
        assert_eq!(canonical_district("Tamalate"), None);
    }

    #[test]
    fn test_default_district_is_first() {
        assert_eq!(DEFAULT_DISTRICT, "Baru");
    }
}
