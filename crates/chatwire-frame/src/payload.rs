//! Typed payload builders and parsers.
//!
//! Each frame kind has a fixed payload layout; [`Payload`] is the
//! structured view. Encoding and decoding are pure functions over byte
//! buffers so they can be tested without any transport.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{Frame, FrameKind};
use crate::error::{FrameError, Result};
use crate::fields::{put_name, put_text, take_name, take_text};

/// Recipient count is one wire byte.
pub const MAX_RECIPIENTS: usize = u8::MAX as usize;

/// Structured view of a frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Claim a display name.
    HandshakeRequest { name: Bytes },
    /// Name accepted.
    HandshakeOk,
    /// Name already in use.
    HandshakeRejected,
    /// Message to every other registered client.
    Broadcast { sender: Bytes, text: Bytes },
    /// Message to explicitly named recipients. Deliveries re-encoded by
    /// the server carry an empty recipient list.
    Message {
        sender: Bytes,
        recipients: Vec<Bytes>,
        text: Bytes,
    },
    /// A named recipient is not registered (reported back to the sender).
    UnknownRecipient { name: Bytes },
    /// Leave the chat.
    ExitRequest,
    /// Exit acknowledged; session over.
    ExitAck,
    /// Request the directory listing.
    ListRequest,
    /// Listing follows with this many entries.
    ListAck { count: u32 },
    /// One directory entry of a listing.
    ListEntry { name: Bytes },
}

impl Payload {
    /// The frame kind this payload encodes as.
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::HandshakeRequest { .. } => FrameKind::HandshakeRequest,
            Self::HandshakeOk => FrameKind::HandshakeOk,
            Self::HandshakeRejected => FrameKind::HandshakeRejected,
            Self::Broadcast { .. } => FrameKind::Broadcast,
            Self::Message { .. } => FrameKind::Message,
            Self::UnknownRecipient { .. } => FrameKind::UnknownRecipient,
            Self::ExitRequest => FrameKind::ExitRequest,
            Self::ExitAck => FrameKind::ExitAck,
            Self::ListRequest => FrameKind::ListRequest,
            Self::ListAck { .. } => FrameKind::ListAck,
            Self::ListEntry { .. } => FrameKind::ListEntry,
        }
    }

    /// Encode this payload into a complete frame.
    pub fn to_frame(&self) -> Result<Frame> {
        let mut body = BytesMut::new();
        match self {
            Self::HandshakeRequest { name } => put_name(&mut body, name)?,
            Self::HandshakeOk
            | Self::HandshakeRejected
            | Self::ExitRequest
            | Self::ExitAck
            | Self::ListRequest => {}
            Self::Broadcast { sender, text } => {
                put_name(&mut body, sender)?;
                put_text(&mut body, text)?;
            }
            Self::Message {
                sender,
                recipients,
                text,
            } => {
                if recipients.len() > MAX_RECIPIENTS {
                    return Err(FrameError::Malformed("more than 255 recipients"));
                }
                put_name(&mut body, sender)?;
                body.put_u8(recipients.len() as u8);
                for recipient in recipients {
                    put_name(&mut body, recipient)?;
                }
                put_text(&mut body, text)?;
            }
            Self::UnknownRecipient { name } => put_name(&mut body, name)?,
            Self::ListAck { count } => body.put_u32(*count),
            Self::ListEntry { name } => put_name(&mut body, name)?,
        }

        // Field limits keep even a maximal MESSAGE payload within the
        // 2-byte frame length, so no frame-size check is needed here.
        Ok(Frame::new(self.kind(), body.freeze()))
    }

    /// Decode a frame's payload according to its kind.
    ///
    /// The declared recipient count of a MESSAGE frame must be fully
    /// satisfiable within the remaining payload bytes; otherwise the
    /// frame fails as malformed rather than reading past the buffer.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let mut body = frame.payload.clone();
        let payload = match frame.kind {
            FrameKind::HandshakeRequest => Self::HandshakeRequest {
                name: take_name(&mut body)?,
            },
            FrameKind::HandshakeOk => Self::HandshakeOk,
            FrameKind::HandshakeRejected => Self::HandshakeRejected,
            FrameKind::Broadcast => Self::Broadcast {
                sender: take_name(&mut body)?,
                text: take_text(&mut body)?,
            },
            FrameKind::Message => {
                let sender = take_name(&mut body)?;
                if body.is_empty() {
                    return Err(FrameError::Malformed("missing recipient count"));
                }
                let count = body.get_u8() as usize;
                let mut recipients = Vec::with_capacity(count.min(MAX_RECIPIENTS));
                for _ in 0..count {
                    recipients.push(take_name(&mut body)?);
                }
                Self::Message {
                    sender,
                    recipients,
                    text: take_text(&mut body)?,
                }
            }
            FrameKind::UnknownRecipient => Self::UnknownRecipient {
                name: take_name(&mut body)?,
            },
            // Request/ack payloads are defined empty; tolerate and ignore
            // any extra bytes for compatibility with older clients that
            // packed their own name into them.
            FrameKind::ExitRequest => Self::ExitRequest,
            FrameKind::ExitAck => Self::ExitAck,
            FrameKind::ListRequest => Self::ListRequest,
            FrameKind::ListAck => {
                if body.len() != 4 {
                    return Err(FrameError::Malformed("list ack count must be 4 bytes"));
                }
                Self::ListAck {
                    count: body.get_u32(),
                }
            }
            FrameKind::ListEntry => Self::ListEntry {
                name: take_name(&mut body)?,
            },
        };
        Ok(payload)
    }
}
