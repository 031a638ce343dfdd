//! Server error types
//!
//! Startup and serve failures that end the process. Request-level problems
//! never surface here; they become HTTP status codes instead.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Another process already listens on the port
    #[error("port {port} is already in use; stop the other service or pick another port")]
    AddrInUse { port: u16 },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid listen address '{0}': {1}")]
    InvalidAddress(String, #[source] std::net::AddrParseError),

    #[error("serving root '{path}' is not usable: {source}")]
    Root {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to open log file: {0}")]
    Log(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Classify a bind failure, singling out the port conflict
    pub fn from_bind(addr: SocketAddr, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::AddrInUse {
            Self::AddrInUse { port: addr.port() }
        } else {
            Self::Bind { addr, source }
        }
    }
}
