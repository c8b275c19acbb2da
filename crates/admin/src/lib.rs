//! PKL Monitor dashboard library.
//!
//! Serves the relocation dashboard API over a Google Sheet. The sheet's
//! published CSV is the only read source; writes go through an Apps
//! Script web app and show up on the next sync.
//!
//! # Security
//!
//! This crate holds the elevated dashboard password and, when configured,
//! a Gemini API key. District logins see only their own district's rows.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gemini;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod sheets;
pub mod state;
