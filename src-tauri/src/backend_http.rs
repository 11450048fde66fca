use std::{
    io::{ErrorKind, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use url::Url;

use crate::backend_readiness::ReadinessProbe;

const MIN_PROBE_TIMEOUT_MS: u64 = 50;
const MAX_RESPONSE_HEAD_BYTES: usize = 16 * 1024;

/// `GET endpoint` over a plain TCP stream; the status code of the reply.
pub fn request_status_code(endpoint: &Url, timeout: Duration) -> Option<u16> {
    if endpoint.scheme() != "http" {
        return None;
    }
    let host = endpoint.host_str()?;
    let port = endpoint.port_or_known_default()?;
    let timeout = timeout.max(Duration::from_millis(MIN_PROBE_TIMEOUT_MS));

    let mut stream = (host, port)
        .to_socket_addrs()
        .ok()?
        .find_map(|address| TcpStream::connect_timeout(&address, timeout).ok())?;
    let _ = stream.set_read_timeout(Some(timeout));
    let _ = stream.set_write_timeout(Some(timeout));

    let request = build_get_request(endpoint, host);
    stream.write_all(request.as_bytes()).ok()?;

    let head = read_response_head(&mut stream)?;
    parse_status_line(&head)
}

fn build_get_request(endpoint: &Url, host: &str) -> String {
    let mut target = endpoint.path().to_string();
    if let Some(query) = endpoint.query() {
        target.push('?');
        target.push_str(query);
    }
    let host_header = match endpoint.port() {
        Some(port) if host.contains(':') => format!("[{host}]:{port}"),
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    format!(
        "GET {target} HTTP/1.1\r\nHost: {host_header}\r\nAccept: */*\r\nConnection: close\r\n\r\n"
    )
}

// Reads until the blank line after the headers; the body is never needed.
fn read_response_head<R: Read>(reader: &mut R) -> Option<Vec<u8>> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                head.extend_from_slice(&chunk[..read]);
                if head.windows(4).any(|window| window == b"\r\n\r\n")
                    || head.len() >= MAX_RESPONSE_HEAD_BYTES
                {
                    break;
                }
            }
            Err(error) if matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                break;
            }
            Err(_) => return None,
        }
    }

    (!head.is_empty()).then_some(head)
}

fn parse_status_line(raw: &[u8]) -> Option<u16> {
    let line_end = raw
        .windows(2)
        .position(|window| window == b"\r\n")
        .unwrap_or(raw.len());
    let line = std::str::from_utf8(&raw[..line_end]).ok()?;
    let mut parts = line.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse::<u16>().ok()
}

/// Health probe against the service's `/healthz`; any 2xx counts as healthy.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    endpoint: Url,
    timeout: Duration,
}

impl HttpHealthProbe {
    pub fn new(endpoint: Url, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }
}

impl ReadinessProbe for HttpHealthProbe {
    fn is_ready(&self) -> bool {
        matches!(
            request_status_code(&self.endpoint, self.timeout),
            Some(status) if (200..300).contains(&status)
        )
    }
}
