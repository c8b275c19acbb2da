//! Authenticated identities and their visibility rules.

use serde::{Deserialize, Serialize};

use super::district::same_district;
use super::record::VendorRecord;

/// Role of an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Sees and edits every district.
    Elevated,
    /// Bound to a single district.
    Scoped,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elevated => write!(f, "elevated"),
            Self::Scoped => write!(f, "scoped"),
        }
    }
}

/// An authenticated actor.
///
/// Created on login and dropped on logout; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Identity {
    /// Unrestricted visibility.
    Elevated {
        /// Login name.
        username: String,
    },
    /// Restricted to one district.
    Scoped {
        /// Bound district, as spelled in the credential table.
        district: String,
    },
}

impl Identity {
    /// Role of this identity.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Elevated { .. } => Role::Elevated,
            Self::Scoped { .. } => Role::Scoped,
        }
    }

    /// Bound district for scoped identities.
    #[must_use]
    pub fn district(&self) -> Option<&str> {
        match self {
            Self::Elevated { .. } => None,
            Self::Scoped { district } => Some(district),
        }
    }

    /// Whether this identity may see `record`.
    #[must_use]
    pub fn can_see(&self, record: &VendorRecord) -> bool {
        self.covers_district(&record.district)
    }

    /// Whether this identity may act on records of `district`.
    #[must_use]
    pub fn covers_district(&self, district: &str) -> bool {
        match self {
            Self::Elevated { .. } => true,
            Self::Scoped { district: bound } => same_district(bound, district),
        }
    }

    /// Name shown in the dashboard header.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Elevated { username } => username,
            Self::Scoped { district } => district,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Elevated.to_string(), "elevated");
        assert_eq!(Role::Scoped.to_string(), "scoped");
    }

    #[test]
    fn test_covers_district() {
        let elevated = Identity::Elevated {
            username: "admin".to_string(),
        };
        let scoped = Identity::Scoped {
            district: "Pisang Utara".to_string(),
        };
        assert!(elevated.covers_district("anything"));
        assert!(scoped.covers_district(" pisang utara"));
        assert!(!scoped.covers_district("Pisang Selatan"));
    }

    #[test]
    fn test_identity_serde_is_tagged() {
        let scoped = Identity::Scoped {
            district: "Baru".to_string(),
        };
        let json = serde_json::to_value(&scoped).expect("serialize");
        assert_eq!(json["role"], "scoped");
        assert_eq!(json["district"], "Baru");
        assert_eq!(scoped.role(), Role::Scoped);
        assert_eq!(scoped.district(), Some("Baru"));
    }
}
