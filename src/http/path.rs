//! Request path translation
//!
//! Maps a raw request target onto a filesystem path below the serving root.
//! `..` segments are resolved lexically and can never climb above the root.

use std::path::{Path, PathBuf};

/// A request target resolved against the serving root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Filesystem path (root joined with the normalised segments)
    pub fs_path: PathBuf,
    /// Percent-decoded URL path, without query or fragment
    pub url_path: String,
    /// Whether the raw (still-encoded) request path ended in `/`
    pub trailing_slash: bool,
}

/// Split a request target into its path and the query string (without `?`)
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    let target = target.split_once('#').map_or(target, |(before, _)| before);
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Resolve a raw request target against `root`
pub fn resolve(root: &Path, target: &str) -> ResolvedPath {
    let (raw_path, _) = split_target(target);
    let url_path = percent_decode(raw_path);
    // An encoded `%2F` does not count; directory URLs need a literal slash
    let trailing_slash = raw_path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if s.contains('\\') || s.contains('\0') => {}
            s => segments.push(s),
        }
    }

    let mut fs_path = root.to_path_buf();
    fs_path.extend(segments);

    ResolvedPath {
        fs_path,
        url_path,
        trailing_slash,
    }
}

/// Decode `%XX` escapes; malformed escapes are kept as-is
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Encode a path for use in an `href`, leaving `/` and unreserved characters intact
pub fn percent_encode_path(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
