//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `auth` - Static credential table behind the `CredentialStore` seam
//! - `scope` - Per-identity visibility filter
//! - `stats` - Search/filter and per-district rollups
//! - `sync` - Snapshot cache and background poller

pub mod auth;
pub mod scope;
pub mod stats;
pub mod sync;

pub use auth::{AuthFailed, CredentialStore, StaticCredentials};
pub use scope::scope;
pub use stats::{
    DistrictRollup, DistrictTally, RecordQuery, Rollup, UNKNOWN_DISTRICT, aggregate,
    district_detail, query,
};
pub use sync::{RefreshOutcome, SyncCache, SyncPoller, SyncSnapshot, SyncStatus};
