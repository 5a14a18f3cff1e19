use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "ER" (0x45 0x52).
pub const MAGIC: [u8; 2] = [0x45, 0x52];

/// Default maximum payload size: the full range of the length prefix.
///
/// Observations and actions can be arbitrarily large tensors, so the
/// default never rejects a frame the header can describe.
pub const DEFAULT_MAX_PAYLOAD: usize = u32::MAX as usize;

/// Upper bound on capacity reserved ahead of payload bytes actually arriving.
const MAX_RESERVE_AHEAD: usize = 8 * 1024 * 1024;

/// Encode a raw payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬──────────────────┐
/// │ Magic (2B)   │ Length    │ Payload          │
/// │ 0x45 0x52    │ (4B LE)   │ (Length bytes)   │
/// │ "ER"         │           │                  │
/// └──────────────┴───────────┴──────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    put_header(payload.len(), dst)?;
    dst.put_slice(payload);
    Ok(())
}

/// Encode a protobuf message directly into a frame, without an
/// intermediate buffer.
pub fn encode_message<M: prost::Message>(message: &M, dst: &mut BytesMut) -> Result<()> {
    put_header(message.encoded_len(), dst)?;
    message
        .encode(dst)
        .map_err(|err| FrameError::Io(std::io::Error::other(err)))
}

fn put_header(len: usize, dst: &mut BytesMut) -> Result<()> {
    let wire_len = u32::try_from(len).map_err(|_| FrameError::PayloadTooLarge {
        size: len,
        max: DEFAULT_MAX_PAYLOAD,
    })?;
    dst.reserve(HEADER_SIZE + len);
    dst.put_slice(&MAGIC);
    dst.put_u32_le(wire_len);
    Ok(())
}

/// Decode one frame payload from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet, in
/// which case capacity for (up to 8 MiB of) the rest of the frame is
/// reserved. On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        src.reserve((total - src.len()).min(MAX_RESERVE_AHEAD));
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Configuration for framed readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: [`DEFAULT_MAX_PAYLOAD`].
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    #[test]
    fn encode_decode_raw_payload() {
        let mut buf = BytesMut::new();
        let payload = b"hello, envrpc!";

        encode_frame(payload, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + payload.len());
        assert_eq!(&buf[0..2], b"ER");

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn encode_message_matches_encode_to_vec() {
        let message = prost_types::Any {
            type_url: "type.googleapis.com/test.Message".to_string(),
            value: vec![1, 2, 3],
        };
        let mut buf = BytesMut::new();
        encode_message(&message, &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.as_ref(), message.encode_to_vec().as_slice());
        assert_eq!(prost_types::Any::decode(frame).unwrap(), message);
    }

    #[test]
    fn decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x45, 0x52, 0x00][..]);
        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn decode_incomplete_payload_reserves_remaining() {
        let mut buf = BytesMut::new();
        encode_frame(&[7u8; 1024], &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
        assert!(buf.capacity() >= HEADER_SIZE + 1024);
        assert_eq!(buf.len(), HEADER_SIZE + 2, "incomplete frame must not be consumed");
    }

    #[test]
    fn decode_invalid_magic() {
        let mut buf = BytesMut::from(&[0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::InvalidMagic)));
    }

    #[test]
    fn decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(1024 * 1024 * 32);

        let result = decode_frame(&mut buf, 16 * 1024 * 1024);
        assert!(matches!(
            result,
            Err(FrameError::PayloadTooLarge { size, max }) if size == 32 * 1024 * 1024 && max == 16 * 1024 * 1024
        ));
    }

    #[test]
    fn default_limit_accepts_large_frames() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(u32::MAX);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn multiple_frames_in_one_buffer() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf).unwrap();
        encode_frame(b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(f1.as_ref(), b"first");
        assert_eq!(f2.as_ref(), b"second");
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert!(frame.is_empty());
    }
}
