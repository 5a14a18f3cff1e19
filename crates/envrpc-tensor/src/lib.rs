//! Conversion between native arrays and envrpc wire tensors.
//!
//! - [`TensorValue`] is the native side: an `ndarray` array per element type,
//!   with scalars as zero-dimensional arrays.
//! - [`pack`] / [`unpack`] convert between [`TensorValue`] and the wire
//!   [`Tensor`](envrpc_proto::Tensor), applying safe casts, single-element
//!   compression/broadcast, and `-1` dimension inference.
//! - [`bounds`] / [`set_bounds`] read and write the inclusive value range of
//!   a [`TensorSpec`](envrpc_proto::TensorSpec).
//! - [`SpecManager`] maps names to the UIDs a session uses on the wire and
//!   packs/unpacks whole name-keyed maps against the advertised specs.

pub mod bounds;
pub mod codec;
pub mod element;
pub mod error;
pub mod json;
pub mod manager;
pub mod spec;
pub mod value;

pub use bounds::{bounds, set_bounds, Bounds};
pub use codec::{pack, resolve_shape, tensor_dtype, unpack};
pub use element::{Element, Numeric};
pub use error::{Result, TensorError};
pub use manager::SpecManager;
pub use spec::{shape_matches, tensor_spec, validate_spec, variable_dims};
pub use value::TensorValue;
