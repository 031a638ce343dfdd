//! Preview header set
//!
//! Cache-disabling and permissive CORS headers attached to every response,
//! so a phone browser always refetches and cross-origin dev tools can read it.

use hyper::header::{HeaderName, HeaderValue};
use hyper::Response;

/// The mandated header set, in the order it is written
pub const PREVIEW_HEADERS: [(&str, &str); 6] = [
    ("cache-control", "no-cache, no-store, must-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST, OPTIONS"),
    ("access-control-allow-headers", "*"),
];

/// Insert the preview headers, replacing any value a builder already set
pub fn apply_preview_headers<B>(response: &mut Response<B>) {
    let headers = response.headers_mut();
    for (name, value) in PREVIEW_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}
