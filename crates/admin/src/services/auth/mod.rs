//! Login check against the static credential table.
//!
//! The table holds one elevated account, configured through the
//! environment, and one scoped account per district in
//! [`DISTRICTS`](pkl_monitor_core::DISTRICTS). A district account's
//! username and password are both the district name with whitespace
//! removed (`pisangutara` for Pisang Utara), compared case-insensitively.
//!
//! Callers depend on [`CredentialStore`] only, so the table can be
//! replaced by a real identity provider later.

mod error;

pub use error::AuthFailed;

use pkl_monitor_core::{Identity, canonical_district, same_district};
use secrecy::{ExposeSecret, SecretString};

use crate::config::AuthConfig;

/// Resolves login credentials to an identity.
pub trait CredentialStore: Send + Sync {
    /// Check `username`/`password` and return the matching identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthFailed` if no entry matches.
    fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthFailed>;
}

/// The fixed credential table.
pub struct StaticCredentials {
    admin_username: String,
    admin_password: SecretString,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .finish()
    }
}

impl StaticCredentials {
    /// Build the table from the elevated account settings.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
        }
    }
}

impl CredentialStore for StaticCredentials {
    fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthFailed> {
        let username = username.trim();

        if username.eq_ignore_ascii_case(&self.admin_username) {
            return if password == self.admin_password.expose_secret() {
                Ok(Identity::Elevated {
                    username: self.admin_username.clone(),
                })
            } else {
                Err(AuthFailed)
            };
        }

        canonical_district(username)
            .filter(|district| same_district(district, password))
            .map(|district| Identity::Scoped {
                district: district.to_string(),
            })
            .ok_or(AuthFailed)
    }
}
