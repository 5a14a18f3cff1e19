//! Protobuf wire schema for the envrpc agent/environment protocol.
//!
//! The messages are declared directly with `prost` derives rather than
//! generated from `.proto` files, so the crate builds without `protoc`.
//!
//! - [`tensor`]: [`DataType`], [`Tensor`], [`TensorSpec`] and the typed
//!   element arrays carried in their payload oneof
//! - [`messages`]: the seven native request/response pairs
//! - [`envelope`]: [`EnvironmentRequest`] / [`EnvironmentResponse`] and the
//!   [`Status`] carried in error responses

pub mod envelope;
pub mod messages;
pub mod tensor;

pub use envelope::{
    code, environment_request, environment_response, EnvironmentRequest, EnvironmentResponse,
    Status,
};
pub use messages::*;
pub use tensor::{tensor_spec, DataType, Payload, Tensor, TensorSpec};

/// Protobuf package of every envrpc message.
pub const PACKAGE: &str = "envrpc.v1";

/// Type URL prefix used when packing messages into `google.protobuf.Any`.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

pub use prost_types::Any;
