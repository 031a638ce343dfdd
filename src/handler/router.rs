//! Request dispatch module
//!
//! Entry point for HTTP request processing: probe short-circuit, method
//! check, static dispatch, then preview headers and access logging.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::HeaderMap;
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw request target (path and query, still percent-encoded)
    pub target: &'a str,
    pub is_head: bool,
    pub if_modified_since: Option<&'a str>,
    pub if_none_match: Option<&'a str>,
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    drop(body);
    let target = parts
        .uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str());

    // Probe paths: empty 204, never logged
    if state.is_probe(target) {
        let mut response = http::build_204_response();
        http::apply_preview_headers(&mut response);
        return Ok(response);
    }

    let mut response = dispatch(&parts, target, &state).await;
    http::apply_preview_headers(&mut response);

    if state.access_log_enabled() {
        let entry = build_access_entry(&parts, target, peer_addr, &response, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch(parts: &Parts, target: &str, state: &AppState) -> Response<Full<Bytes>> {
    match &parts.method {
        &Method::GET | &Method::HEAD => {
            let ctx = RequestContext {
                target,
                is_head: parts.method == Method::HEAD,
                if_modified_since: header_str(&parts.headers, "if-modified-since"),
                if_none_match: header_str(&parts.headers, "if-none-match"),
            };
            static_files::serve(&ctx, state).await
        }
        &Method::OPTIONS => http::build_options_response(),
        method => {
            logger::log_warning(&format!("Unsupported method: {method} {target}"));
            http::build_501_response()
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn build_access_entry(
    parts: &Parts,
    target: &str,
    peer_addr: SocketAddr,
    response: &Response<Full<Bytes>>,
    started: Instant,
) -> AccessLogEntry {
    let (path, query) = http::path::split_target(target);
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        path.to_string(),
    );
    entry.query = query.map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header_str(&parts.headers, "referer").map(ToString::to_string);
    entry.user_agent = header_str(&parts.headers, "user-agent").map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
