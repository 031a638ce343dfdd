// Server loop module
// Serial accept-and-serve loop: one connection at a time, in arrival order

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::serve_connection;
use crate::config::AppState;
use crate::logger;

/// Accept and serve connections until `shutdown` is notified.
///
/// Each connection is served to completion before the next `accept`, so no
/// two requests are ever handled concurrently. Shutdown is observed both
/// while idle and while a connection is in flight; an in-flight connection
/// is dropped.
pub async fn run_server_loop(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            biased;

            () = shutdown.notified() => break,

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        tokio::select! {
                            biased;
                            () = shutdown.notified() => break,
                            () = serve_connection(stream, peer_addr, Arc::clone(&state)) => {}
                        }
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }
        }
    }
}
