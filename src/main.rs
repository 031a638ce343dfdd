use clap::Parser;
use std::process::ExitCode;

use preview_server::cli::Cli;
use preview_server::{logger, server, Config, ServerError};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ServerError> {
    let cfg = Config::load_from(&cli.config, &cli.overrides())?;
    logger::init(&cfg).map_err(ServerError::Log)?;

    // Requests are served one at a time; a single-threaded runtime is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(server::run(cfg))
}
