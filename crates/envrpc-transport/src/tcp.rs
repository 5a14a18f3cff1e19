use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::Stream;

/// TCP listener for sessions that cross host boundaries.
pub struct TcpSocket {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpSocket {
    /// Bind and listen on `addr` (`host:port`; port 0 picks a free port).
    pub fn bind(addr: &str) -> Result<Self> {
        let bind_error = |source: std::io::Error| TransportError::Bind {
            endpoint: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        configure(&stream)?;
        debug!(%peer, "accepted connection");
        Ok(Stream::from(stream))
    }

    /// Connect to a listening TCP socket (blocking).
    pub fn connect(addr: &str) -> Result<Stream> {
        let stream = TcpStream::connect(addr).map_err(|source| TransportError::Connect {
            endpoint: addr.to_string(),
            source,
        })?;
        configure(&stream)?;
        debug!(addr, "connected to tcp socket");
        Ok(Stream::from(stream))
    }

    /// Connect, giving each resolved address at most `timeout` to accept.
    /// `None` blocks like [`TcpSocket::connect`].
    pub fn connect_timeout(addr: &str, timeout: Option<Duration>) -> Result<Stream> {
        let Some(timeout) = timeout else {
            return Self::connect(addr);
        };
        let connect_error = |source: io::Error| TransportError::Connect {
            endpoint: addr.to_string(),
            source,
        };

        let mut last_err = None;
        for socket_addr in addr.to_socket_addrs().map_err(connect_error)? {
            match TcpStream::connect_timeout(&socket_addr, timeout) {
                Ok(stream) => {
                    configure(&stream)?;
                    debug!(addr, ?timeout, "connected to tcp socket");
                    return Ok(Stream::from(stream));
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(connect_error(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
        })))
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

// One request is in flight at a time, so Nagle only adds latency.
fn configure(stream: &TcpStream) -> Result<()> {
    stream.set_nodelay(true)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn bind_accept_connect() {
        let listener = TcpSocket::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().to_string();

        let handle = std::thread::spawn(move || {
            let mut client = TcpSocket::connect(&addr).expect("connect should succeed");
            client.write_all(b"hello").expect("write should succeed");
        });

        let mut server = listener.accept().expect("accept should succeed");
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).expect("read should succeed");
        assert_eq!(&buf, b"hello");
        assert_eq!(server.transport_name(), "tcp");
        assert!(server.peer_credentials().is_none());

        handle.join().expect("client thread should finish");
    }

    #[test]
    fn connect_refused_is_connect_error() {
        let port = {
            let listener = TcpSocket::bind("127.0.0.1:0").expect("bind should succeed");
            listener.local_addr().port()
        };
        let err = TcpSocket::connect(&format!("127.0.0.1:{port}"))
            .expect_err("connect to closed port should fail");
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[test]
    fn connect_timeout_reaches_listener() {
        let listener = TcpSocket::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().to_string();

        let handle = std::thread::spawn(move || {
            TcpSocket::connect_timeout(&addr, Some(Duration::from_secs(1)))
                .expect("connect should succeed")
        });
        let _server = listener.accept().expect("accept should succeed");
        let client = handle.join().expect("client thread should finish");
        assert_eq!(client.transport_name(), "tcp");
    }

    #[test]
    fn connect_timeout_bounds_unanswered_handshake() {
        // Non-routable: the handshake is dropped or has no route at all.
        let started = std::time::Instant::now();
        let err = TcpSocket::connect_timeout("10.255.255.1:9", Some(Duration::from_millis(200)))
            .expect_err("connect to a non-routable address should fail");
        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
