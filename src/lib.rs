//! No-cache static file server for mobile preview.
//!
//! Serves files from a directory over HTTP/1.1, one connection at a time,
//! attaching cache-disabling and permissive CORS headers to every response.
//! Requests for development-tool probe paths (`/@vite/client` by default)
//! get an empty 204 and are never logged.

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{AppState, Config, Overrides};
pub use error::ServerError;
