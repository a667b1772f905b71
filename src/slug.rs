//! File-name slugs for persisted reports.

use chrono::{DateTime, Utc};

use crate::models::ComplianceTarget;

/// Hosts are long in the worst case; file names stay readable
const MAX_SLUG_LENGTH: usize = 48;

/// Lower-case, every non-alphanumeric run becomes one dash, no dash at
/// either end.
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_dash = true;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            result.push(c);
            prev_dash = false;
        } else if !prev_dash {
            result.push('-');
            prev_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}

/// [`slugify`], cut back to a dash boundary when longer than the limit.
pub fn slugify_truncate(text: &str) -> String {
    let mut result = slugify(text);
    if result.chars().count() > MAX_SLUG_LENGTH {
        let cut = result
            .char_indices()
            .nth(MAX_SLUG_LENGTH)
            .map(|(i, _)| i)
            .unwrap_or(result.len());
        match result[..cut].rfind('-') {
            Some(pos) if pos > 0 => result.truncate(pos),
            _ => result.truncate(cut),
        }
    }
    if result.ends_with('-') {
        result.pop();
    }
    result
}

/// `<host-slug>-<YYYYmmddTHHMMSSZ>.json`; the whole url stands in when the
/// host cannot be parsed.
pub fn report_file_name(target: &ComplianceTarget, started_at: DateTime<Utc>) -> String {
    let host = target.host().unwrap_or_else(|| target.url().to_string());
    let slug = match slugify_truncate(host.trim_start_matches("www.")) {
        s if s.is_empty() => "report".to_string(),
        s => s,
    };
    format!("{}-{}.json", slug, started_at.format("%Y%m%dT%H%M%SZ"))
}
