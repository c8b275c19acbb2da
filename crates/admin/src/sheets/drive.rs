//! Google Drive share links to embeddable thumbnails.

use std::sync::LazyLock;

use regex::Regex;

/// Preview width requested from the thumbnail endpoint.
const THUMBNAIL_SIZE: &str = "w800";

/// File id in either `/d/<id>` or `id=<id>` form; `/d/` is tried first.
static DRIVE_FILE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([^/?#]+)|id=([^&?#]+)").expect("Invalid regex"));

/// Rewrite a Drive share URL into a direct thumbnail URL.
///
/// Share links open a viewer page and cannot be used as an `<img>` source.
/// Anything that is not a Drive link, or a Drive link without a
/// recognizable file id, is returned unchanged.
#[must_use]
pub fn rewrite(url: &str) -> String {
    if url.is_empty() || !url.contains("drive.google.com") {
        return url.to_string();
    }

    let id = DRIVE_FILE_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str());

    match id {
        Some(id) => format!("https://drive.google.com/thumbnail?id={id}&sz={THUMBNAIL_SIZE}"),
        None => url.to_string(),
    }
}
