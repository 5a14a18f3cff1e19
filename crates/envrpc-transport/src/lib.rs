//! Stream transports for envrpc sessions.
//!
//! A session runs over exactly one connected byte stream. This crate hides
//! whether that stream is a Unix domain socket (local trust) or a TCP socket
//! behind the [`Stream`] type, and resolves textual addresses into an
//! [`Endpoint`] that can be bound or connected.

pub mod endpoint;
pub mod error;
pub mod stream;
pub mod tcp;

#[cfg(unix)]
pub mod uds;

pub use endpoint::{Endpoint, Listener};
pub use error::{Result, TransportError};
pub use stream::Stream;
pub use tcp::TcpSocket;

#[cfg(unix)]
pub use uds::UnixDomainSocket;
