//! PKL Monitor Core - Shared types library.
//!
//! This crate provides the domain types used across all PKL Monitor components:
//! - `admin` - Dashboard backend (sync pipeline, HTTP surface)
//! - `cli` - Command-line tools for sync, listing, and record dispatch
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Vendor records, relocation status, districts, and identities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
