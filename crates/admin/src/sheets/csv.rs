//! Delimited-text splitting for the published sheet export.
//!
//! The export is simple enough that a full CSV reader is not needed: rows
//! never span lines, and the only quoting that matters is a comma inside a
//! double-quoted field.

/// Split `text` into lines on `\n`, dropping a trailing `\r` from each.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Split one line on commas that are not inside a double-quoted field.
///
/// Fields are returned raw (quotes and padding intact); see [`clean_field`].
#[must_use]
pub fn split_row(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(line.get(start..i).unwrap_or_default());
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(line.get(start..).unwrap_or_default());
    fields
}

/// Trim a raw field, strip one layer of wrapping quotes, and unescape `""`.
#[must_use]
pub fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let was_double_quoted = trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"');

    let unwrapped = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let unwrapped = unwrapped.strip_suffix(['"', '\'']).unwrap_or(unwrapped);
    let unwrapped = unwrapped.trim();

    if was_double_quoted {
        unwrapped.replace("\"\"", "\"")
    } else {
        unwrapped.to_string()
    }
}
