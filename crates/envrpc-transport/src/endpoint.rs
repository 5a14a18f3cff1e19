use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TransportError};
use crate::stream::Stream;
use crate::tcp::TcpSocket;
#[cfg(unix)]
use crate::uds::UnixDomainSocket;

/// Where a session stream lives.
///
/// Textual forms:
/// - `unix:/run/env.sock`, or any value containing `/` → Unix domain socket
/// - `tcp://host:port` or `host:port` → TCP
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Endpoint {
    /// Open a stream to this endpoint (single attempt, blocking).
    pub fn connect(&self) -> Result<Stream> {
        self.connect_timeout(None)
    }

    /// Open a stream, bounding how long a TCP handshake may take. Unix
    /// sockets connect or fail immediately and ignore `timeout`.
    pub fn connect_timeout(&self, timeout: Option<Duration>) -> Result<Stream> {
        match self {
            #[cfg(unix)]
            Endpoint::Unix(path) => UnixDomainSocket::connect(path),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::Unsupported(self.to_string())),
            Endpoint::Tcp(addr) => TcpSocket::connect_timeout(addr, timeout),
        }
    }

    /// Bind a listener on this endpoint.
    pub fn bind(&self) -> Result<Listener> {
        match self {
            #[cfg(unix)]
            Endpoint::Unix(path) => Ok(Listener::Unix(UnixDomainSocket::bind(path)?)),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::Unsupported(self.to_string())),
            Endpoint::Tcp(addr) => Ok(Listener::Tcp(TcpSocket::bind(addr)?)),
        }
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason| TransportError::InvalidEndpoint {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("endpoint must not be empty"));
        }

        if let Some(path) = trimmed.strip_prefix("unix:") {
            let path = path.strip_prefix("//").unwrap_or(path);
            if path.is_empty() {
                return Err(invalid("unix endpoint requires a socket path"));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }

        if let Some(addr) = trimmed.strip_prefix("tcp://") {
            return parse_tcp(addr).ok_or_else(|| invalid("tcp endpoint must be host:port"));
        }

        if trimmed.contains('/') || trimmed.ends_with(".sock") {
            return Ok(Endpoint::Unix(PathBuf::from(trimmed)));
        }

        parse_tcp(trimmed).ok_or_else(|| invalid("expected unix:<path>, a socket path, or host:port"))
    }
}

fn parse_tcp(addr: &str) -> Option<Endpoint> {
    let (host, port) = addr.rsplit_once(':')?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return None;
    }
    Some(Endpoint::Tcp(addr.to_string()))
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

/// A bound listener for either endpoint kind.
pub enum Listener {
    #[cfg(unix)]
    Unix(UnixDomainSocket),
    Tcp(TcpSocket),
}

impl Listener {
    /// Accept the next incoming stream (blocking).
    pub fn accept(&self) -> Result<Stream> {
        match self {
            #[cfg(unix)]
            Listener::Unix(socket) => socket.accept(),
            Listener::Tcp(socket) => socket.accept(),
        }
    }

    /// The endpoint clients should connect to.
    ///
    /// For TCP listeners bound to port 0 this carries the assigned port.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            #[cfg(unix)]
            Listener::Unix(socket) => Endpoint::Unix(socket.path().to_path_buf()),
            Listener::Tcp(socket) => Endpoint::Tcp(socket.local_addr().to_string()),
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("endpoint", &self.endpoint())
            .finish()
    }
}
