// Listener module
// Creates the TCP listener; a port already taken by another process is reported, never shared

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::error::ServerError;

/// Create a `TcpListener` bound to `addr`.
///
/// `SO_REUSEADDR` is enabled on Unix so a restart is not blocked by sockets
/// in `TIME_WAIT`; it does not allow binding while another listener is
/// active. `SO_REUSEPORT` is deliberately left off so a second server on the
/// same port fails with [`ServerError::AddrInUse`].
///
/// Must be called from within a Tokio runtime.
pub fn bind_listener(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    bind_socket(addr).map_err(|e| ServerError::from_bind(addr, e))
}

fn bind_socket(addr: SocketAddr) -> std::io::Result<TcpListener> {
    // Create socket with appropriate domain (IPv4 or IPv6)
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    #[cfg(unix)]
    socket.set_reuse_address(true)?;

    // Set non-blocking mode for async compatibility
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;

    // Start listening with a backlog queue size of 128
    socket.listen(128)?;

    // Convert socket2::Socket to std::net::TcpListener, then to tokio::net::TcpListener
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
