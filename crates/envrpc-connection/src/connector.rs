use std::io::ErrorKind;
use std::thread;
use std::time::{Duration, Instant};

use envrpc_frame::FrameConfig;
use envrpc_transport::{Endpoint, TransportError};
use tracing::{info, trace};

use crate::connection::Connection;
use crate::error::{ConnectionError, Result};

/// How long [`connect`] waits for the endpoint to start accepting.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

// Zero is not a valid handshake timeout.
const MIN_ATTEMPT: Duration = Duration::from_millis(1);

/// Client connection settings.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Upper bound on waiting for the endpoint to accept connections.
    /// `None` waits indefinitely.
    pub ready_timeout: Option<Duration>,
    /// Frame limits and per-call socket timeouts for the session.
    pub frame: FrameConfig,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            ready_timeout: Some(DEFAULT_READY_TIMEOUT),
            frame: FrameConfig::default(),
        }
    }
}

/// Connect to an environment server with default configuration.
pub fn connect(endpoint: &Endpoint) -> Result<Connection> {
    connect_with_config(endpoint, &ConnectConfig::default())
}

/// Connect with explicit configuration.
///
/// While the endpoint does not exist yet, refuses connections or leaves the
/// handshake unanswered, retries until `ready_timeout` elapses. A TCP
/// handshake is only given the time left in that budget.
pub fn connect_with_config(endpoint: &Endpoint, config: &ConnectConfig) -> Result<Connection> {
    let started = Instant::now();
    let stream = loop {
        let remaining = config
            .ready_timeout
            .map(|timeout| timeout.saturating_sub(started.elapsed()).max(MIN_ATTEMPT));
        match endpoint.connect_timeout(remaining) {
            Ok(stream) => break stream,
            Err(err) if is_not_ready(&err) => {
                if let Some(timeout) = config.ready_timeout {
                    if started.elapsed() >= timeout {
                        return Err(ConnectionError::Timeout {
                            endpoint: endpoint.to_string(),
                            timeout,
                        });
                    }
                }
                trace!(%endpoint, error = %err, "endpoint not ready, retrying");
                thread::sleep(RETRY_INTERVAL);
            }
            Err(err) => return Err(err.into()),
        }
    };

    info!(%endpoint, transport = stream.transport_name(), "connected");
    Connection::from_stream_with_config(stream, config.frame.clone())
}

fn is_not_ready(err: &TransportError) -> bool {
    matches!(
        err.io_kind(),
        Some(ErrorKind::NotFound | ErrorKind::ConnectionRefused | ErrorKind::TimedOut)
    )
}
