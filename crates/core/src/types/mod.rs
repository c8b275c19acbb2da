//! Core types for PKL Monitor.
//!
//! This module provides type-safe wrappers for the dashboard's domain concepts.

pub mod district;
pub mod identity;
pub mod record;
pub mod status;

pub use district::{DEFAULT_DISTRICT, DISTRICTS, canonical_district, district_key, same_district};
pub use identity::{Identity, Role};
pub use record::{NO_HISTORY_PLACEHOLDER, RecordDraft, VendorRecord};
pub use status::{RelocationStatus, StatusFilter};
