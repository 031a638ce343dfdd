//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from request dispatch.

pub mod cache;
pub mod headers;
pub mod mime;
pub mod path;
pub mod response;

// Re-export commonly used items
pub use headers::{apply_preview_headers, PREVIEW_HEADERS};
pub use response::{
    build_204_response, build_304_response, build_404_response, build_501_response,
    build_file_response, build_html_response, build_options_response, build_redirect_response,
};
