//! Google Sheets integration.
//!
//! The read side is the sheet's published CSV export, fetched through
//! [`SheetSource`]. The write side is an Apps Script web app reached through
//! [`AppsScriptGateway`]; it appends, overwrites, or removes rows and stores
//! uploaded photos in a Drive folder.

mod csv;
pub mod drive;
mod error;
mod gateway;
mod normalize;
mod source;

pub use error::{DispatchFailed, SourceError};
pub use gateway::{AppsScriptGateway, Dispatched, MutationAction, photo_data_url};
pub use normalize::{MIN_FIELDS, ParsedSheet, parse_row, parse_sheet};
pub use source::{RecordSource, SheetSource};
