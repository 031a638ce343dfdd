// Application state module
// Read-only state shared by every request

use std::path::PathBuf;

use super::types::Config;
use crate::error::ServerError;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical serving root, resolved once at startup
    pub root: PathBuf,
}

impl AppState {
    /// Create `AppState`, resolving the serving root against the working directory
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        let root = PathBuf::from(&config.server.root)
            .canonicalize()
            .map_err(|source| ServerError::Root {
                path: config.server.root.clone(),
                source,
            })?;
        if !root.is_dir() {
            return Err(ServerError::Root {
                path: config.server.root.clone(),
                source: std::io::Error::other("not a directory"),
            });
        }

        Ok(Self {
            config: config.clone(),
            root,
        })
    }

    pub fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }

    /// Whether the raw request target hits one of the configured probe paths
    pub fn is_probe(&self, target: &str) -> bool {
        self.config
            .preview
            .probe_paths
            .iter()
            .any(|probe| !probe.is_empty() && target.contains(probe.as_str()))
    }
}
