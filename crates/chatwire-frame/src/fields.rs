//! Length-prefixed field encoding.
//!
//! Names and message text may contain any byte value, so the declared
//! lengths are the only source of truth — consumers never scan for a
//! terminator to determine extent.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Maximum display-name length in bytes.
pub const MAX_NAME: usize = 250;

/// Maximum message-text length per frame in bytes.
pub const MAX_MESSAGE: usize = 1000;

/// Append a name field: one length byte followed by the raw bytes.
pub fn put_name(dst: &mut BytesMut, name: &[u8]) -> Result<()> {
    if name.len() > MAX_NAME {
        return Err(FrameError::NameTooLong { len: name.len() });
    }
    dst.put_u8(name.len() as u8);
    dst.put_slice(name);
    Ok(())
}

/// Consume a name field from the front of `src`.
///
/// Fails if the length byte is missing or declares more bytes than the
/// buffer holds.
pub fn take_name(src: &mut Bytes) -> Result<Bytes> {
    if src.is_empty() {
        return Err(FrameError::Malformed("missing name length byte"));
    }
    let len = src.get_u8() as usize;
    if src.remaining() < len {
        return Err(FrameError::Malformed("name extends past payload end"));
    }
    Ok(src.copy_to_bytes(len))
}

/// Append message text followed by its display terminator byte.
///
/// The terminator is part of the declared frame length for MESSAGE and
/// BROADCAST frames (a convenience carried over from the wire format's
/// origins); [`take_text`] strips it again.
pub fn put_text(dst: &mut BytesMut, text: &[u8]) -> Result<()> {
    if text.len() > MAX_MESSAGE {
        return Err(FrameError::MessageTooLong { len: text.len() });
    }
    dst.put_slice(text);
    dst.put_u8(0);
    Ok(())
}

/// Consume the rest of `src` as message text, stripping the terminator.
pub fn take_text(src: &mut Bytes) -> Result<Bytes> {
    let mut text = src.copy_to_bytes(src.remaining());
    if text.last() == Some(&0) {
        text.truncate(text.len() - 1);
    }
    if text.len() > MAX_MESSAGE {
        return Err(FrameError::MessageTooLong { len: text.len() });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_name(name: &[u8]) -> Bytes {
        let mut buf = BytesMut::new();
        put_name(&mut buf, name).unwrap();
        assert_eq!(buf.len(), 1 + name.len());
        let mut bytes = buf.freeze();
        let decoded = take_name(&mut bytes).unwrap();
        assert!(bytes.is_empty());
        decoded
    }

    #[test]
    fn name_roundtrip() {
        assert_eq!(roundtrip_name(b"alice").as_ref(), b"alice");
    }

    #[test]
    fn empty_name_roundtrip() {
        assert_eq!(roundtrip_name(b"").as_ref(), b"");
    }

    #[test]
    fn max_length_name_roundtrip() {
        let name = vec![0xC3u8; MAX_NAME];
        assert_eq!(roundtrip_name(&name).as_ref(), name.as_slice());
    }

    #[test]
    fn non_ascii_name_roundtrip() {
        let name: Vec<u8> = (0u8..=250).step_by(5).collect();
        assert_eq!(roundtrip_name(&name).as_ref(), name.as_slice());
    }

    #[test]
    fn oversized_name_rejected() {
        let mut buf = BytesMut::new();
        let err = put_name(&mut buf, &vec![b'x'; MAX_NAME + 1]).unwrap_err();
        assert!(matches!(err, FrameError::NameTooLong { len: 251 }));
    }

    #[test]
    fn length_byte_is_authoritative() {
        // The 0x00 inside the name must not terminate it.
        let decoded = roundtrip_name(b"ali\x00ce");
        assert_eq!(decoded.as_ref(), b"ali\x00ce");
    }

    #[test]
    fn truncated_name_rejected() {
        let mut bytes = Bytes::from_static(&[5, b'a', b'b']);
        let err = take_name(&mut bytes).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn missing_length_byte_rejected() {
        let mut bytes = Bytes::new();
        let err = take_name(&mut bytes).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn text_roundtrip_strips_terminator() {
        let mut buf = BytesMut::new();
        put_text(&mut buf, b"hi there").unwrap();
        assert_eq!(buf.len(), 9); // text + terminator

        let mut bytes = buf.freeze();
        let text = take_text(&mut bytes).unwrap();
        assert_eq!(text.as_ref(), b"hi there");
    }

    #[test]
    fn text_without_terminator_accepted() {
        let mut bytes = Bytes::from_static(b"bare");
        let text = take_text(&mut bytes).unwrap();
        assert_eq!(text.as_ref(), b"bare");
    }

    #[test]
    fn oversized_text_rejected() {
        let mut buf = BytesMut::new();
        let err = put_text(&mut buf, &vec![b'm'; MAX_MESSAGE + 1]).unwrap_err();
        assert!(matches!(err, FrameError::MessageTooLong { len: 1001 }));
    }

    #[test]
    fn max_length_text_roundtrip() {
        let text = vec![0xFFu8; MAX_MESSAGE];
        let mut buf = BytesMut::new();
        put_text(&mut buf, &text).unwrap();
        let mut bytes = buf.freeze();
        assert_eq!(take_text(&mut bytes).unwrap().as_ref(), text.as_slice());
    }
}
