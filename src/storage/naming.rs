// src/storage/naming.rs
//! Directory naming for saved artifacts.
//!
//! An artifact directory is `<sanitized-title>_<timestamp>`, with a `-N`
//! suffix when that name is already taken.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Used when a title has nothing usable in it.
pub const DEFAULT_TITLE: &str = "Untitled";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H_%M_%S";
const TIMESTAMP_LEN: usize = 19;

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Map a title onto `[A-Za-z0-9_-]`, replacing every other character with
/// an underscore.
///
/// - Surrounding whitespace is trimmed first
/// - Blank titles and titles with no safe character become [`DEFAULT_TITLE`]
pub fn sanitize_title(title: &str) -> String {
    let trimmed = title.trim();
    if !trimmed.chars().any(is_safe) {
        return DEFAULT_TITLE.to_string();
    }
    trimmed
        .chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect()
}

/// Seconds-resolution timestamp without colons or fractions.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn dir_name(title: &str, at: &DateTime<Utc>) -> String {
    format!("{}_{}", sanitize_title(title), format_timestamp(at))
}

/// True for names this module could have produced. Anything else (path
/// separators, dots) is never treated as an artifact.
pub fn is_artifact_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_safe)
}

/// Split an artifact directory name back into its title part and creation
/// time. Returns `None` for names that do not follow the layout.
pub fn parse_dir_name(name: &str) -> Option<(&str, DateTime<Utc>)> {
    let base = match name.rsplit_once('-') {
        Some((head, counter))
            if !counter.is_empty() && counter.chars().all(|c| c.is_ascii_digit()) =>
        {
            head
        }
        _ => name,
    };

    if base.len() <= TIMESTAMP_LEN + 1 || !base.is_char_boundary(base.len() - TIMESTAMP_LEN) {
        return None;
    }
    let (head, stamp) = base.split_at(base.len() - TIMESTAMP_LEN);
    let title = head.strip_suffix('_')?;
    let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

    Some((title, Utc.from_utc_datetime(&naive)))
}
