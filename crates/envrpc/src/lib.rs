//! Typed tensor request/response protocol for remote environments.
//!
//! A client connects to an environment server over a Unix domain socket or
//! TCP, creates or joins a world, and steps it by exchanging UID-keyed
//! tensors that conform to the action and observation specs the server
//! advertised.
//!
//! # Crate Structure
//!
//! - [`transport`]: stream transport (Unix domain sockets, TCP) and endpoints
//! - [`frame`]: length-prefixed framing of encoded envelopes
//! - [`proto`]: wire schema (tensors, specs, requests, envelopes, status)
//! - [`tensor`]: tensor codec, bounds model and spec manager
//! - [`connection`]: client connection, extensions and server loop
//!
//! ```no_run
//! use envrpc::connection::connect;
//! use envrpc::proto::CreateWorldRequest;
//! use envrpc::transport::Endpoint;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint: Endpoint = "unix:/run/env.sock".parse()?;
//! let connection = connect(&endpoint)?;
//! let created = connection.send(CreateWorldRequest::default())?;
//! println!("created {}", created.world_name);
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use envrpc_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use envrpc_frame::*;
}

/// Re-export wire schema types.
pub mod proto {
    pub use envrpc_proto::*;
}

/// Re-export tensor codec types.
pub mod tensor {
    pub use envrpc_tensor::*;
}

/// Re-export connection types.
pub mod connection {
    pub use envrpc_connection::*;
}
