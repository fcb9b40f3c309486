use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_frame, Frame};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete frames.
#[derive(Debug)]
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// EOF at a frame boundary yields `ConnectionClosed`; EOF after a
    /// partial frame yields `ShortRead`. Both signal peer closure and are
    /// fatal to the connection.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf)? {
                trace!(kind = frame.kind.name(), len = frame.payload.len(), "frame in");
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Err(FrameError::ConnectionClosed);
                }
                return Err(FrameError::ShortRead);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Whether a complete frame is already buffered, so the next
    /// [`read_frame`](Self::read_frame) returns without touching the
    /// stream. Readiness loops must drain these before polling again,
    /// as no readiness event fires for bytes already read.
    pub fn has_buffered_frame(&self) -> bool {
        if self.buf.len() < crate::codec::HEADER_SIZE {
            return false;
        }
        let total = u16::from_be_bytes([self.buf[0], self.buf[1]]) as usize;
        total <= self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
