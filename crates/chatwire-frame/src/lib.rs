//! Binary wire framing for the chatwire protocol.
//!
//! Every message on the wire is framed with:
//! - A 2-byte big-endian total length (header included)
//! - A 1-byte message-type tag
//!
//! Names are carried as one length byte followed by raw bytes — the
//! length byte is authoritative, never a terminator scan. Message text
//! is bounded to [`MAX_MESSAGE`] bytes per frame.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod fields;
pub mod payload;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, Frame, FrameKind, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use fields::{MAX_MESSAGE, MAX_NAME};
pub use payload::Payload;
pub use reader::FrameReader;
pub use writer::FrameWriter;
