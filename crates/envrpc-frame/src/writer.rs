use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use envrpc_transport::Stream;
use tracing::trace;

use crate::codec::{encode_frame, encode_message, FrameConfig};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Frame and write a raw payload (blocking).
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        self.check_size(payload.len())?;
        self.buf.clear();
        encode_frame(payload, &mut self.buf)?;
        self.write_buffered()
    }

    /// Encode a protobuf message into a frame and write it (blocking).
    pub fn write_message<M: prost::Message>(&mut self, message: &M) -> Result<()> {
        self.check_size(message.encoded_len())?;
        self.buf.clear();
        encode_message(message, &mut self.buf)?;
        self.write_buffered()
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: self.config.max_payload_size,
            });
        }
        Ok(())
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        trace!(size = self.buf.len(), "wrote frame");

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame encoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<Stream> {
    /// Create a frame writer for a session stream and apply the write
    /// timeout from config.
    pub fn with_config_stream(inner: Stream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::decode_frame;
    use crate::reader::FrameReader;

    fn written_frames(writer: FrameWriter<Cursor<Vec<u8>>>) -> Vec<Vec<u8>> {
        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        let mut frames = Vec::new();
        while let Some(frame) = decode_frame(&mut wire, usize::MAX).unwrap() {
            frames.push(frame.to_vec());
        }
        assert!(wire.is_empty());
        frames
    }

    #[test]
    fn write_multiple_frames() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.write_frame(b"one").unwrap();
        writer.write_frame(b"two").unwrap();
        writer.write_frame(b"three").unwrap();

        assert_eq!(
            written_frames(writer),
            vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
        );
    }

    #[test]
    fn write_message_is_readable() {
        let message = prost_types::Any {
            type_url: "type.googleapis.com/test.Step".to_string(),
            value: vec![9; 32],
        };
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_message(&message).unwrap();

        let wire = writer.into_inner().into_inner();
        let mut reader = FrameReader::new(Cursor::new(wire));
        let decoded: prost_types::Any = reader.read_message().unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn payload_too_large_rejected() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.write_frame(b"oversized").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 9, max: 4 }));

        let message = prost_types::Any {
            type_url: "long-enough".to_string(),
            value: Vec::new(),
        };
        let err = writer.write_message(&message).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(written_frames(writer).is_empty());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.write_frame(b"x").unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn retries_interrupted_write() {
        let mut writer = FrameWriter::new(FailOnceWriter {
            kind: ErrorKind::Interrupted,
            failed_write: false,
            failed_flush: false,
            data: Vec::new(),
        });
        writer.write_frame(b"retry").unwrap();
        assert!(!writer.into_inner().data.is_empty());
    }

    #[test]
    fn would_block_is_io_error() {
        let mut writer = FrameWriter::new(FailOnceWriter {
            kind: ErrorKind::WouldBlock,
            failed_write: false,
            failed_flush: false,
            data: Vec::new(),
        });
        let err = writer.write_frame(b"stalled").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.write_frame(b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn broken_pipe_is_io_error() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        drop(right);
        let mut writer = FrameWriter::new(Stream::from(left));
        let err = writer.write_frame(b"nobody listening").unwrap_err();
        assert!(matches!(err, FrameError::Io(_)));
    }

    #[test]
    fn applies_write_timeout_for_stream() {
        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };

        let writer = FrameWriter::with_config_stream(Stream::from(left), cfg);
        assert!(writer.is_ok());
    }

    #[test]
    fn write_timeout_bounds_stalled_peer() {
        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(50)),
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config_stream(Stream::from(left), cfg).unwrap();

        // Far larger than the socket buffer; the peer never reads.
        let payload = vec![0u8; 16 * 1024 * 1024];
        let started = std::time::Instant::now();
        let err = writer.write_frame(&payload).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Io(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        ));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailOnceWriter {
        kind: ErrorKind,
        failed_write: bool,
        failed_flush: bool,
        data: Vec<u8>,
    }

    impl Write for FailOnceWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.failed_write {
                self.failed_write = true;
                return Err(std::io::Error::from(self.kind));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.failed_flush {
                self.failed_flush = true;
                return Err(std::io::Error::from(self.kind));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
