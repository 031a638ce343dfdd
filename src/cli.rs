//! Command-line interface
//!
//! `preview-server [port] [--root DIR] [--host ADDR] [--config FILE]`

use clap::Parser;

use crate::config::{Overrides, DEFAULT_CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(name = "preview-server")]
#[command(about = "No-cache static file server for mobile preview", long_about = None)]
pub struct Cli {
    /// Port to listen on (default 8081)
    pub port: Option<u16>,

    /// Directory to serve (default: current directory)
    #[arg(short, long)]
    pub root: Option<String>,

    /// Address to bind (default: all interfaces)
    #[arg(long)]
    pub host: Option<String>,

    /// Optional configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            root: self.root.clone(),
        }
    }
}
