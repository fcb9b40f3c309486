/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header carries a message-type tag this protocol does
    /// not define.
    #[error("unknown message-type tag {0}")]
    UnknownTag(u8),

    /// A payload field does not match its declared layout.
    #[error("malformed payload: {0}")]
    Malformed(&'static str),

    /// A name exceeds the 250-byte wire limit.
    #[error("name too long ({len} bytes, max {max})", max = crate::fields::MAX_NAME)]
    NameTooLong { len: usize },

    /// Message text exceeds the 1000-byte per-frame limit.
    #[error("message text too long ({len} bytes, max {max})", max = crate::fields::MAX_MESSAGE)]
    MessageTooLong { len: usize },

    /// The encoded frame would not fit the 2-byte length header.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection at a frame boundary.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer closed the connection mid-frame; fewer bytes arrived
    /// than the header declared.
    #[error("short read (connection closed mid-frame)")]
    ShortRead,
}

pub type Result<T> = std::result::Result<T, FrameError>;
