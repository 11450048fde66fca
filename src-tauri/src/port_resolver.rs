use std::net::{IpAddr, SocketAddr, TcpListener, ToSocketAddrs};

use crate::error::SupervisorError;

pub const PORT_SCAN_WINDOW: u16 = 20;

/// First bindable port in `preferred..preferred + PORT_SCAN_WINDOW` on `host`.
pub fn resolve_port(host: &str, preferred: u16) -> Result<u16, SupervisorError> {
    resolve_port_in_window(host, preferred, PORT_SCAN_WINDOW)
}

pub fn resolve_port_in_window(
    host: &str,
    preferred: u16,
    window: u16,
) -> Result<u16, SupervisorError> {
    let mut last = preferred;
    if let Some(ip) = first_address(host) {
        for offset in 0..window {
            let Some(candidate) = preferred.checked_add(offset) else {
                break;
            };
            last = candidate;
            if can_bind(SocketAddr::new(ip, candidate)) {
                return Ok(candidate);
            }
        }
    }

    Err(SupervisorError::PortExhausted {
        host: host.to_string(),
        first: preferred,
        last,
    })
}

/// The address the service will bind: the first one `host` resolves to.
fn first_address(host: &str) -> Option<IpAddr> {
    match (host, 0).to_socket_addrs() {
        Ok(mut addrs) => addrs.next().map(|addr| addr.ip()),
        Err(error) => {
            log::debug!("port scan host did not resolve: host={host}, error={error}");
            None
        }
    }
}

// The listener is dropped before returning, so the check never holds the port.
fn can_bind(addr: SocketAddr) -> bool {
    match TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            true
        }
        Err(error) => {
            log::debug!("port bind check failed: addr={addr}, error={error}");
            false
        }
    }
}
