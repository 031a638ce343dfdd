// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub preview: PreviewConfig,
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory request paths are resolved against
    pub root: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (common, combined, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "common".to_string()
}

/// Preview behaviour: probe suppression and directory handling
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Substrings of the request target answered with an empty 204 and never logged
    #[serde(default = "default_probe_paths")]
    pub probe_paths: Vec<String>,
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    #[serde(default = "default_directory_listing")]
    pub directory_listing: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_probe_paths() -> Vec<String> {
    vec!["/@vite/client".to_string()]
}

#[allow(clippy::missing_const_for_fn)]
fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

#[allow(clippy::missing_const_for_fn)]
fn default_directory_listing() -> bool {
    true
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            probe_paths: default_probe_paths(),
            index_files: default_index_files(),
            directory_listing: default_directory_listing(),
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PerformanceConfig {
    /// Upper bound in seconds for serving one connection
    pub request_timeout: u64,
}
