use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: total length (2, big-endian, header included) + tag (1).
pub const HEADER_SIZE: usize = 3;

/// Largest frame representable by the 2-byte length header.
pub const MAX_FRAME: usize = u16::MAX as usize;

/// Message-type tags.
///
/// Values are part of the wire contract and must stay stable within one
/// deployment. Tag 6 is reserved and never emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    /// Client → server: claim a display name.
    HandshakeRequest = 1,
    /// Server → client: name accepted.
    HandshakeOk = 2,
    /// Server → client: name already in use.
    HandshakeRejected = 3,
    /// Message to every other registered client.
    Broadcast = 4,
    /// Message to explicitly named recipients.
    Message = 5,
    /// Server → client: a named recipient is not registered.
    UnknownRecipient = 7,
    /// Client → server: leave the chat.
    ExitRequest = 8,
    /// Server → client: exit acknowledged; session over.
    ExitAck = 9,
    /// Client → server: request the directory listing.
    ListRequest = 10,
    /// Server → client: listing follows; payload carries the entry count.
    ListAck = 11,
    /// Server → client: one directory entry of the listing.
    ListEntry = 12,
}

impl FrameKind {
    /// Parse a wire tag.
    pub fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            1 => Self::HandshakeRequest,
            2 => Self::HandshakeOk,
            3 => Self::HandshakeRejected,
            4 => Self::Broadcast,
            5 => Self::Message,
            7 => Self::UnknownRecipient,
            8 => Self::ExitRequest,
            9 => Self::ExitAck,
            10 => Self::ListRequest,
            11 => Self::ListAck,
            12 => Self::ListEntry,
            other => return Err(FrameError::UnknownTag(other)),
        })
    }

    /// The wire tag for this kind.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Human-readable tag name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::HandshakeRequest => "HANDSHAKE_REQUEST",
            Self::HandshakeOk => "HANDSHAKE_OK",
            Self::HandshakeRejected => "HANDSHAKE_REJECTED",
            Self::Broadcast => "BROADCAST",
            Self::Message => "MESSAGE",
            Self::UnknownRecipient => "UNKNOWN_RECIPIENT",
            Self::ExitRequest => "EXIT_REQUEST",
            Self::ExitAck => "EXIT_ACK",
            Self::ListRequest => "LIST_REQUEST",
            Self::ListAck => "LIST_ACK",
            Self::ListEntry => "LIST_ENTRY",
        }
    }
}

/// A complete wire frame: message-type tag plus its encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The message type.
    pub kind: FrameKind,
    /// Type-specific encoded fields.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(kind: FrameKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// The declared length always equals the header size plus the exact byte
/// count of the payload that follows.
pub fn encode_frame(kind: FrameKind, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let total = HEADER_SIZE + payload.len();
    if total > MAX_FRAME {
        return Err(FrameError::FrameTooLarge {
            size: total,
            max: MAX_FRAME,
        });
    }
    dst.reserve(total);
    dst.put_u16(total as u16);
    dst.put_u8(kind.tag());
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly `total length` bytes from the buffer —
/// never more, never fewer.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let total = u16::from_be_bytes([src[0], src[1]]) as usize;
    if total < HEADER_SIZE {
        return Err(FrameError::Malformed("declared length below header size"));
    }
    let kind = FrameKind::from_tag(src[2])?;

    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(total - HEADER_SIZE).freeze();

    Ok(Some(Frame { kind, payload }))
}
