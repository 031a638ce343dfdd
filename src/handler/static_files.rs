//! Static file serving module
//!
//! Resolves a request target below the serving root and loads files,
//! index pages and directory listings.

use crate::config::AppState;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, path};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fs::Metadata;
use std::path::Path;
use tokio::fs;

/// Serve a GET/HEAD request from the serving root
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let resolved = path::resolve(&state.root, ctx.target);

    // Missing files are the common case, no logging needed
    let Ok(metadata) = fs::metadata(&resolved.fs_path).await else {
        return http::build_404_response();
    };

    if !is_within_root(&resolved.fs_path, &state.root).await {
        logger::log_warning(&format!(
            "Path outside serving root blocked: {}",
            ctx.target
        ));
        return http::build_404_response();
    }

    if metadata.is_dir() {
        return serve_directory(ctx, state, &resolved).await;
    }

    // A trailing slash, literal or encoded, names a directory; a regular file here is not found
    if resolved.trailing_slash || resolved.url_path.ends_with('/') {
        return http::build_404_response();
    }

    serve_file(ctx, &resolved.fs_path, &metadata).await
}

async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &AppState,
    resolved: &path::ResolvedPath,
) -> Response<Full<Bytes>> {
    if !resolved.trailing_slash {
        return http::build_redirect_response(&slash_redirect_target(ctx.target));
    }

    for index_file in &state.config.preview.index_files {
        let index_path = resolved.fs_path.join(index_file);
        if let Ok(metadata) = fs::metadata(&index_path).await {
            if metadata.is_file() {
                return serve_file(ctx, &index_path, &metadata).await;
            }
        }
    }

    if !state.config.preview.directory_listing {
        return http::build_404_response();
    }

    match listing::render(&resolved.fs_path, &resolved.url_path).await {
        Ok(html) => http::build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_warning(&format!(
                "Cannot list directory '{}': {e}",
                resolved.fs_path.display()
            ));
            http::build_404_response()
        }
    }
}

/// Load a single file, answering 304 when the client copy is current
pub async fn serve_file(
    ctx: &RequestContext<'_>,
    file_path: &Path,
    metadata: &Metadata,
) -> Response<Full<Bytes>> {
    let modified = metadata.modified().ok();
    let last_modified = modified.map(cache::format_http_date);

    if let (Some(modified), Some(last_modified)) = (modified, last_modified.as_deref()) {
        if cache::is_not_modified(ctx.if_modified_since, ctx.if_none_match, modified) {
            return http::build_304_response(last_modified);
        }
    }

    let content = match fs::read(file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            return http::build_404_response();
        }
    };

    http::build_file_response(
        Bytes::from(content),
        mime::content_type_for(file_path),
        last_modified.as_deref(),
        ctx.is_head,
    )
}

/// Location for a directory requested without its trailing slash,
/// keeping the original encoding and query string
fn slash_redirect_target(target: &str) -> String {
    let (raw_path, query) = path::split_target(target);
    match query {
        Some(q) => format!("{raw_path}/?{q}"),
        None => format!("{raw_path}/"),
    }
}

/// Symlinks may point anywhere; the canonical target must stay under the root
async fn is_within_root(fs_path: &Path, root: &Path) -> bool {
    fs::canonicalize(fs_path)
        .await
        .is_ok_and(|canonical| canonical.starts_with(root))
}
