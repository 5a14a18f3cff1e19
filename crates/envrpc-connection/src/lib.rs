//! Request/response channel for envrpc sessions.
//!
//! A [`Connection`] owns one duplex stream and exchanges exactly one
//! response envelope per request envelope, strictly in order. Native
//! requests map statically to their envelope field ([`NativeRequest`]);
//! anything else travels as an extension wrapped in `Any`.
//!
//! The server side reads requests with [`serve_stream`] and answers them
//! through an [`Environment`] handler.

pub mod connection;
pub mod connector;
pub mod envelope;
pub mod error;
pub mod extension;
pub mod server;

pub use connection::{Connection, ConnectionState};
pub use connector::{connect, connect_with_config, ConnectConfig, DEFAULT_READY_TIMEOUT};
pub use envelope::{
    pack_environment_request, pack_environment_response, unpack_environment_request,
    unpack_environment_response, EnvelopeField, NativeRequest,
};
pub use error::{ConnectionError, Result, RpcError};
pub use extension::{pack_extension, type_name, unpack_extension, ExtensionRegistry};
pub use server::{
    serve_stream, serve_stream_with_config, Environment, EnvironmentListener, HandlerResult,
    Session,
};
