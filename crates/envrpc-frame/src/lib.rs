//! Length-prefixed framing for envrpc session streams.
//!
//! Every envelope on the wire is framed with:
//! - A 2-byte magic number ("ER") for stream synchronization
//! - A 4-byte little-endian payload length
//!
//! followed by the protobuf-encoded envelope. Readers always hand back
//! complete frames; partial reads are handled internally.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, encode_message, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
    MAGIC,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
