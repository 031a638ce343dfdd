// Configuration module entry point
// Layered loading: defaults, optional file, PREVIEW__ environment, command line

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LoggingConfig, PerformanceConfig, PreviewConfig, ServerConfig};

/// Default config file name (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "preview.toml";

/// Values given on the command line, applied on top of every other source
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<String>,
}

impl Config {
    /// Load configuration from the specified file path.
    /// A missing file is not an error; built-in defaults apply.
    pub fn load_from(config_path: &str, overrides: &Overrides) -> Result<Self, ServerError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("PREVIEW")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("preview.probe_paths")
                    .with_list_parse_key("preview.index_files")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("server.root", ".")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.request_timeout", 30)?
            .set_default("preview.probe_paths", vec!["/@vite/client"])?
            .set_default("preview.index_files", vec!["index.html", "index.htm"])?
            .set_default("preview.directory_listing", true)?
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option("server.root", overrides.root.clone())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ServerError::InvalidAddress(format!("{}:{}", self.server.host, self.server.port), e))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8081,
                root: ".".to_string(),
            },
            logging: LoggingConfig {
                access_log: true,
                access_log_format: "common".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            preview: PreviewConfig::default(),
            performance: PerformanceConfig { request_timeout: 30 },
        }
    }
}
