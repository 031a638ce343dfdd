//! HTTP conditional request module
//!
//! Provides `Last-Modified` formatting and `If-Modified-Since` handling.
//! Caching itself is disabled by the preview headers; revalidation still
//! lets a browser skip the body when nothing changed on disk.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// IMF-fixdate layout used by `Last-Modified`, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a file modification time as an HTTP date
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date header value
///
/// Returns `None` for anything that is not a valid RFC 2822 style date.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Check whether the client's copy is still current
///
/// `If-None-Match` takes precedence over `If-Modified-Since`; since no
/// `ETag` is ever sent, its presence simply disables the date comparison.
/// Comparison is done at second precision, as HTTP dates carry no fractions.
///
/// # Returns
/// Returns true if the response should be 304 Not Modified
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    if_none_match: Option<&str>,
    modified: SystemTime,
) -> bool {
    if if_none_match.is_some() {
        return false;
    }
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}
