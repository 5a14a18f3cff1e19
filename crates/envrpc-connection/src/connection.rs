use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use envrpc_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use envrpc_proto::{Any, EnvironmentRequest, EnvironmentResponse};
use envrpc_transport::Stream;
use prost::{Message, Name};
use tracing::{debug, trace, warn};

use crate::envelope::{
    pack_environment_request, unpack_environment_response, EnvelopeField, NativeRequest,
};
use crate::error::{ConnectionError, Result};
use crate::extension::pack_extension;

/// Lifecycle of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

struct Io {
    reader: FrameReader<Stream>,
    writer: FrameWriter<Stream>,
}

/// A client session over one duplex stream.
///
/// Each call writes one request envelope and reads back exactly one
/// response envelope. Calls from several threads are serialized; there is
/// no multiplexing. [`Connection::close`] may be called from any thread,
/// including while another thread is blocked in a call.
pub struct Connection {
    io: Mutex<Io>,
    control: Stream,
    closed: AtomicBool,
}

impl Connection {
    /// Wrap an established stream using the default frame configuration.
    pub fn from_stream(stream: Stream) -> Result<Self> {
        Self::from_stream_with_config(stream, FrameConfig::default())
    }

    /// Wrap an established stream with explicit frame configuration.
    pub fn from_stream_with_config(stream: Stream, config: FrameConfig) -> Result<Self> {
        let control = stream.try_clone()?;
        let reader = FrameReader::with_config_stream(stream.try_clone()?, config.clone())?;
        let writer = FrameWriter::with_config_stream(stream, config)?;
        debug!(transport = control.transport_name(), "connection open");
        Ok(Self {
            io: Mutex::new(Io { reader, writer }),
            control,
            closed: AtomicBool::new(false),
        })
    }

    /// Send a request and wait for its response.
    ///
    /// A response carrying the `error` field fails with
    /// [`ConnectionError::Rpc`]; a response in any field other than the
    /// request's fails with [`ConnectionError::UnexpectedResponse`].
    pub fn send<R: NativeRequest>(&self, request: R) -> Result<R::Response> {
        let envelope = pack_environment_request(request);
        let response = self.exchange(&envelope, R::FIELD)?;
        unpack_environment_response::<R>(response)
    }

    /// Wrap an application message as an extension, send it, and return the
    /// still-wrapped extension response.
    pub fn send_extension<M: Message + Name>(&self, message: &M) -> Result<Any> {
        self.send(pack_extension(message))
    }

    fn exchange(
        &self,
        request: &EnvironmentRequest,
        field: EnvelopeField,
    ) -> Result<EnvironmentResponse> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        let Ok(mut io) = self.io.lock() else {
            // A previous call panicked mid-exchange; the stream is out of step.
            let _ = self.close();
            return Err(ConnectionError::Closed);
        };
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }

        debug!(%field, "sending request");
        io.writer.write_message(request).map_err(|err| {
            // Size is checked before any byte is written.
            let in_step = matches!(err, FrameError::PayloadTooLarge { .. });
            self.fail(err, in_step)
        })?;
        let response: EnvironmentResponse = io.reader.read_message().map_err(|err| {
            // A decode failure consumed the whole frame.
            let in_step = matches!(err, FrameError::Decode(_));
            self.fail(err, in_step)
        })?;
        trace!(%field, "received response");
        Ok(response)
    }

    /// Map a frame error from an exchange. Unless the stream is known to
    /// still pair responses with requests, the connection is closed so a
    /// later call cannot read a stale response.
    fn fail(&self, err: FrameError, in_step: bool) -> ConnectionError {
        if self.is_closed() {
            return ConnectionError::Closed;
        }
        if !in_step {
            warn!(error = %err, "exchange failed mid-stream, closing connection");
            let _ = self.close();
        }
        err.into()
    }

    /// Close the connection. Idempotent.
    ///
    /// Shuts the socket down in both directions without waiting for an
    /// in-flight call, which then fails with [`ConnectionError::Closed`].
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("closing connection");
        self.control.shutdown()?;
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        if self.is_closed() {
            ConnectionState::Closed
        } else {
            ConnectionState::Open
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Peer (pid, uid, gid) for Unix domain socket sessions on Linux.
    pub fn peer_credentials(&self) -> Option<(u32, u32, u32)> {
        self.control.peer_credentials()
    }

    pub fn transport_name(&self) -> &'static str {
        self.control.transport_name()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &self.control.transport_name())
            .field("state", &self.state())
            .finish()
    }
}
