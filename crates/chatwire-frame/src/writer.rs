use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_frame, Frame};
use crate::error::{FrameError, Result};
use crate::payload::Payload;

/// Writes complete frames to any `Write` stream.
#[derive(Debug)]
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
        }
    }

    /// Encode and send a payload as one frame.
    pub fn send(&mut self, payload: &Payload) -> Result<()> {
        let frame = payload.to_frame()?;
        self.write_frame(&frame)
    }

    /// Write an already-built frame, flushing before returning.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.buf.clear();
        encode_frame(frame.kind, &frame.payload, &mut self.buf)?;

        let mut written = 0;
        while written < self.buf.len() {
            match self.inner.write(&self.buf[written..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => written += n,
                Err(err)
                    if err.kind() == ErrorKind::Interrupted
                        || err.kind() == ErrorKind::WouldBlock =>
                {
                    continue
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.inner.flush()?;
        trace!(kind = frame.kind.name(), len = frame.payload.len(), "frame out");
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
