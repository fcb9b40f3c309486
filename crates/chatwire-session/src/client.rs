use std::net::ToSocketAddrs;
#[cfg(unix)]
use std::os::fd::{AsRawFd, RawFd};

use bytes::Bytes;
use tracing::debug;

use chatwire_frame::{FrameError, FrameReader, FrameWriter, Payload, MAX_MESSAGE};
use chatwire_transport::Connection;

use crate::error::{Result, SessionError};

/// Something the server said, decoded for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A targeted message addressed to us.
    Message { sender: Bytes, text: Bytes },
    /// A broadcast from another client.
    Broadcast { sender: Bytes, text: Bytes },
    /// One of our message recipients was not connected.
    UnknownRecipient { name: Bytes },
    /// Reply to a listing request: every connected name, in the order
    /// the server registered them.
    Listing(Vec<Bytes>),
    /// The server acknowledged our exit request.
    ExitAcknowledged,
    /// The server closed the connection.
    ServerClosed,
}

/// Client side of a chat session.
///
/// [`connect`](Self::connect) completes the handshake before returning,
/// so an existing `ChatClient` is always a named, accepted participant.
#[derive(Debug)]
pub struct ChatClient {
    name: Bytes,
    reader: FrameReader<Connection>,
    writer: FrameWriter<Connection>,
}

impl ChatClient {
    /// Connect to the server and claim `name`.
    ///
    /// Fails with [`SessionError::HandleInUse`] when another client
    /// already holds the name; the server closes the connection after
    /// rejecting, so the caller must reconnect to retry.
    pub fn connect(
        addr: impl ToSocketAddrs + std::fmt::Display,
        name: impl Into<Bytes>,
    ) -> Result<Self> {
        let name = name.into();
        let conn = Connection::connect(addr)?;
        let writer_half = conn.try_clone()?;

        let mut client = Self {
            name: name.clone(),
            reader: FrameReader::new(conn),
            writer: FrameWriter::new(writer_half),
        };

        client.writer.send(&Payload::HandshakeRequest { name })?;
        match client.read_payload()? {
            Some(Payload::HandshakeOk) => {
                debug!(name = ?client.name, "handshake accepted");
                Ok(client)
            }
            Some(Payload::HandshakeRejected) => Err(SessionError::HandleInUse),
            Some(other) => Err(SessionError::UnexpectedFrame(other.kind().name())),
            None => Err(SessionError::Disconnected(
                "server closed during handshake".into(),
            )),
        }
    }

    /// The name this client registered under.
    pub fn name(&self) -> &Bytes {
        &self.name
    }

    /// Send `text` to the named recipients.
    ///
    /// Text longer than the per-frame limit is split into consecutive
    /// frames, each addressed to the same recipients.
    pub fn send_message(&mut self, recipients: &[Bytes], text: &[u8]) -> Result<()> {
        for chunk in chunks_of(text) {
            self.writer.send(&Payload::Message {
                sender: self.name.clone(),
                recipients: recipients.to_vec(),
                text: Bytes::copy_from_slice(chunk),
            })?;
        }
        Ok(())
    }

    /// Send `text` to every other connected client.
    pub fn send_broadcast(&mut self, text: &[u8]) -> Result<()> {
        for chunk in chunks_of(text) {
            self.writer.send(&Payload::Broadcast {
                sender: self.name.clone(),
                text: Bytes::copy_from_slice(chunk),
            })?;
        }
        Ok(())
    }

    /// Ask the server for the connected-client listing. The reply
    /// arrives as [`Event::Listing`] from [`next_event`](Self::next_event).
    pub fn request_listing(&mut self) -> Result<()> {
        self.writer.send(&Payload::ListRequest)?;
        Ok(())
    }

    /// Announce departure. The server replies with
    /// [`Event::ExitAcknowledged`] and then closes the connection.
    pub fn send_exit(&mut self) -> Result<()> {
        self.writer.send(&Payload::ExitRequest)?;
        Ok(())
    }

    /// Block until the server sends something.
    ///
    /// A listing reply is gathered across its count and entry frames
    /// and surfaced as a single [`Event::Listing`].
    pub fn next_event(&mut self) -> Result<Event> {
        let Some(payload) = self.read_payload()? else {
            return Ok(Event::ServerClosed);
        };
        match payload {
            Payload::Message { sender, text, .. } => Ok(Event::Message { sender, text }),
            Payload::Broadcast { sender, text } => Ok(Event::Broadcast { sender, text }),
            Payload::UnknownRecipient { name } => Ok(Event::UnknownRecipient { name }),
            Payload::ExitAck => Ok(Event::ExitAcknowledged),
            Payload::ListAck { count } => self.collect_listing(count),
            other => Err(SessionError::UnexpectedFrame(other.kind().name())),
        }
    }

    /// Whether a complete frame is already buffered, so the next
    /// [`next_event`](Self::next_event) returns without blocking.
    pub fn has_buffered_event(&self) -> bool {
        self.reader.has_buffered_frame()
    }

    /// Close the connection without the exit exchange.
    pub fn shutdown(&self) -> Result<()> {
        self.reader.get_ref().shutdown()?;
        Ok(())
    }

    fn collect_listing(&mut self, count: u32) -> Result<Event> {
        let mut names = Vec::with_capacity(count as usize);
        for _ in 0..count {
            match self.read_payload()? {
                Some(Payload::ListEntry { name }) => names.push(name),
                Some(other) => {
                    return Err(SessionError::UnexpectedFrame(other.kind().name()))
                }
                None => {
                    return Err(SessionError::Disconnected(
                        "server closed mid-listing".into(),
                    ))
                }
            }
        }
        Ok(Event::Listing(names))
    }

    /// Read one payload; `None` means the server hung up cleanly.
    fn read_payload(&mut self) -> Result<Option<Payload>> {
        match self.reader.read_frame() {
            Ok(frame) => Ok(Some(Payload::from_frame(&frame)?)),
            Err(FrameError::ConnectionClosed | FrameError::ShortRead) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(unix)]
impl AsRawFd for ChatClient {
    fn as_raw_fd(&self) -> RawFd {
        self.reader.get_ref().as_stream().as_raw_fd()
    }
}

/// Split `text` into frame-sized chunks, yielding one empty chunk for
/// empty input so every send produces at least one frame.
fn chunks_of(text: &[u8]) -> impl Iterator<Item = &[u8]> {
    let empty: &[u8] = b"";
    let mut once = if text.is_empty() { Some(empty) } else { None };
    let mut chunks = text.chunks(MAX_MESSAGE);
    std::iter::from_fn(move || once.take().or_else(|| chunks.next()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_splits_at_frame_limit() {
        let text = vec![b'x'; MAX_MESSAGE * 2 + 5];
        let chunks: Vec<_> = chunks_of(&text).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), MAX_MESSAGE);
        assert_eq!(chunks[1].len(), MAX_MESSAGE);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn empty_text_still_yields_one_chunk() {
        let chunks: Vec<_> = chunks_of(b"").collect();
        assert_eq!(chunks, vec![b"" as &[u8]]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_chunk() {
        let text = vec![b'y'; MAX_MESSAGE];
        let chunks: Vec<_> = chunks_of(&text).collect();
        assert_eq!(chunks.len(), 1);
    }
}
