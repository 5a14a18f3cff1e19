use std::time::Duration;

use envrpc_proto::{Any, Status};

use crate::envelope::EnvelopeField;

/// Errors that can occur while exchanging envelopes.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] envrpc_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] envrpc_frame::FrameError),

    /// An extension payload that does not decode as its declared type.
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The server answered with its `error` field.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The server answered with a field other than the one the request
    /// expects.
    #[error("expected response field {expected} but received {actual}")]
    UnexpectedResponse {
        expected: EnvelopeField,
        actual: EnvelopeField,
    },

    /// An envelope with no payload field populated.
    #[error("envelope has no payload")]
    EmptyEnvelope,

    /// An extension whose type is not in the caller's allow-list.
    #[error("extension type {type_url:?} is not one of the known types [{}]", .known.join(", "))]
    UnknownExtension { type_url: String, known: Vec<String> },

    /// The connection was closed before or during the call.
    #[error("connection is closed")]
    Closed,

    /// The endpoint did not accept connections within the readiness timeout.
    #[error("{endpoint} not ready after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },
}

impl ConnectionError {
    /// The server error, if this is one.
    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            ConnectionError::Rpc(err) => Some(err),
            _ => None,
        }
    }
}

/// An error reported by the server: status code, message and details.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("rpc error (code {code}): {message}")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub details: Vec<Any>,
}

impl From<Status> for RpcError {
    fn from(status: Status) -> Self {
        Self {
            code: status.code,
            message: status.message,
            details: status.details,
        }
    }
}

impl From<RpcError> for Status {
    fn from(err: RpcError) -> Self {
        Status {
            code: err.code,
            message: err.message,
            details: err.details,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
