// Server module entry point
// Binds the listener, runs the serial server loop and handles shutdown

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::sync::Arc;

use crate::config::{AppState, Config};
use crate::error::ServerError;
use crate::logger;

// Re-export common items
pub use listener::bind_listener;
pub use server_loop::run_server_loop;
pub use signal::{start_signal_handler, SignalHandler};

/// Run the preview server until SIGINT/SIGTERM.
///
/// Must be called from within a Tokio runtime.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let state = Arc::new(AppState::new(&config)?);
    let addr = config.get_socket_addr()?;
    let listener = bind_listener(addr)?;

    logger::log_server_start(&listener.local_addr()?, &state.root, &config);

    let signals = Arc::new(SignalHandler::new());
    start_signal_handler(Arc::clone(&signals));

    run_server_loop(listener, state, Arc::clone(&signals.shutdown)).await;

    logger::log_server_stopped();
    Ok(())
}
