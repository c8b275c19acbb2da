//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DASHBOARD_ADMIN_PASSWORD` - Password of the elevated identity (high entropy)
//!
//! ## Optional
//! - `DASHBOARD_HOST` - Bind address (default: 127.0.0.1)
//! - `DASHBOARD_PORT` - Listen port (default: 3001)
//! - `DASHBOARD_ADMIN_USERNAME` - Elevated login name (default: admin)
//! - `SHEET_CSV_URL` - Published CSV export of the vendor sheet
//! - `APPS_SCRIPT_URL` - Apps Script web app that applies mutations
//! - `TARGET_SHEET_ID` - Spreadsheet the script writes to
//! - `TARGET_FOLDER_ID` - Drive folder the script stores photos in
//! - `SYNC_INTERVAL_SECS` - Background refresh period (default: 30)
//! - `WRITE_REFRESH_DELAY_MS` - Delay before refreshing after a write (default: 2000)
//! - `SESSION_EXPIRY_SECS` - Idle time after which a login lapses (default: 43200)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (Gemini - enables AI summaries)
//! - `GEMINI_API_KEY` - Google Generative Language API key
//! - `GEMINI_MODEL` - Model ID (default: gemini-3-flash-preview)
//! - `GEMINI_API_BASE` - API base URL (default: Google endpoint)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ADMIN_PASSWORD_LENGTH: usize = 12;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_SHEET_CSV_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vQhvZdx-Xv_0M29sMqHaftdOweqqWvCnDaXx6IZmiioqae2kYIhJZ5ToP_pQZax0XYO-8FnyagK1__6/pub?output=csv";
const DEFAULT_APPS_SCRIPT_URL: &str = "https://script.google.com/macros/s/AKfycbzNIC_6aoVMICn170I3voOQcZ5bvS1wLdwPR0y2wq7_0q_wi0BxclbII3hdVCX6I3CZ/exec";
const DEFAULT_TARGET_SHEET_ID: &str = "1Wq14Vhri5MZoVP7XN-mMQAB9Yh3Ccag6n66_NyLcCsg";
const DEFAULT_TARGET_FOLDER_ID: &str = "1v512TPNJm752mNGSM4GufacyAGn6QlQs";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Source of configuration values, keyed by variable name.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Static credential table settings
    pub auth: AuthConfig,
    /// Spreadsheet source and mutation endpoint
    pub sheet: SheetConfig,
    /// Refresh timing
    pub sync: SyncConfig,
    /// Gemini configuration (optional - enables AI summaries)
    pub gemini: Option<GeminiConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Credentials of the elevated identity.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: SecretString,
    /// Inactivity after which a session and its login ticket lapse
    pub session_expiry: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .field("session_expiry", &self.session_expiry)
            .finish()
    }
}

impl AuthConfig {
    fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let admin_username = get_or_default(lookup, "DASHBOARD_ADMIN_USERNAME", "admin");
        let admin_password = get_required(lookup, "DASHBOARD_ADMIN_PASSWORD")?;
        validate_password_length(&admin_password, "DASHBOARD_ADMIN_PASSWORD")?;
        validate_secret_strength(&admin_password, "DASHBOARD_ADMIN_PASSWORD")?;

        let expiry_secs = get_or_default(lookup, "SESSION_EXPIRY_SECS", "43200")
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar("SESSION_EXPIRY_SECS".to_string(), e.to_string()))?;
        if expiry_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SESSION_EXPIRY_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            admin_username,
            admin_password: SecretString::from(admin_password),
            session_expiry: Duration::from_secs(expiry_secs),
        })
    }
}

/// Spreadsheet endpoints.
///
/// The CSV URL is the published read side; the Apps Script URL receives
/// mutations tagged with the two destination identifiers.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub csv_url: Url,
    pub apps_script_url: Url,
    pub target_sheet_id: String,
    pub target_folder_id: String,
}

impl SheetConfig {
    /// Load the spreadsheet settings on their own (used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a URL does not parse.
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            csv_url: get_url(lookup, "SHEET_CSV_URL", DEFAULT_SHEET_CSV_URL)?,
            apps_script_url: get_url(lookup, "APPS_SCRIPT_URL", DEFAULT_APPS_SCRIPT_URL)?,
            target_sheet_id: get_or_default(lookup, "TARGET_SHEET_ID", DEFAULT_TARGET_SHEET_ID),
            target_folder_id: get_or_default(lookup, "TARGET_FOLDER_ID", DEFAULT_TARGET_FOLDER_ID),
        })
    }
}

/// Refresh timing.
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Period of the silent background refresh
    pub interval: Duration,
    /// Delay between a dispatched write and the follow-up refresh
    pub write_refresh_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            write_refresh_delay: Duration::from_millis(2000),
        }
    }
}

impl SyncConfig {
    fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let interval_secs = get_or_default(lookup, "SYNC_INTERVAL_SECS", "30")
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar("SYNC_INTERVAL_SECS".to_string(), e.to_string()))?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SYNC_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let delay_ms = get_or_default(lookup, "WRITE_REFRESH_DELAY_MS", "2000")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("WRITE_REFRESH_DELAY_MS".to_string(), e.to_string())
            })?;

        Ok(Self {
            interval: Duration::from_secs(interval_secs),
            write_refresh_delay: Duration::from_millis(delay_ms),
        })
    }
}

/// Gemini API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// Google API key
    pub api_key: SecretString,
    /// Model ID (e.g., gemini-3-flash-preview)
    pub model: String,
    /// Base URL of the Generative Language API
    pub api_base: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiConfig {
    /// Load the Gemini settings; `None` when no API key is set.
    #[must_use]
    pub fn from_lookup(lookup: Lookup<'_>) -> Option<Self> {
        let api_key = get_optional(lookup, "GEMINI_API_KEY")?;
        Some(Self {
            api_key: SecretString::from(api_key),
            model: get_or_default(lookup, "GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            api_base: get_or_default(lookup, "GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
        })
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the admin password fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`DashboardConfig::from_env`].
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let host = get_or_default(lookup, "DASHBOARD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_HOST".to_string(), e.to_string()))?;
        let port = get_or_default(lookup, "DASHBOARD_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_PORT".to_string(), e.to_string()))?;

        let auth = AuthConfig::from_lookup(lookup)?;
        let sheet = SheetConfig::from_lookup(lookup)?;
        let sync = SyncConfig::from_lookup(lookup)?;
        let gemini = GeminiConfig::from_lookup(lookup);
        let sentry_dsn = get_optional(lookup, "SENTRY_DSN");
        let sentry_environment = get_optional(lookup, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional(lookup, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional(lookup, "SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            auth,
            sheet,
            sync,
            gemini,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns a reference to the Gemini configuration, if available.
    ///
    /// Returns `None` if `GEMINI_API_KEY` was not set, which disables
    /// AI summaries.
    #[must_use]
    pub const fn gemini(&self) -> Option<&GeminiConfig> {
        self.gemini.as_ref()
    }
}

/// Variable source backed by the process environment.
#[must_use]
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn get_required(lookup: Lookup<'_>, key: &str) -> Result<String, ConfigError> {
    lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional(lookup: Lookup<'_>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.is_empty())
}

fn get_or_default(lookup: Lookup<'_>, key: &str, default: &str) -> String {
    get_optional(lookup, key).unwrap_or_else(|| default.to_string())
}

fn get_url(lookup: Lookup<'_>, key: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = get_or_default(lookup, key, default);
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn validate_password_length(password: &str, var_name: &str) -> Result<(), ConfigError> {
    let length = password.chars().count();
    if length < MIN_ADMIN_PASSWORD_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters (got {length})"),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
