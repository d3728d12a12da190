//! Multipart message framing.
//!
//! Wire layout: one `u8` part count, then each part as a `u32` little-endian
//! length prefix followed by that many bytes. Part 0 is the topic tag; the
//! payload, when present, is part 1. A frame with zero parts or a part
//! larger than [`MAX_PART_LEN`] is rejected before any allocation happens.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::ProtocolError;

/// Upper bound on a single part. Broadcast payloads for even very large
/// traffic samples stay well under this; anything bigger is a corrupt or
/// hostile peer.
pub const MAX_PART_LEN: usize = 1024 * 1024;

/// A decoded multipart message.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    parts: Vec<Bytes>,
}

impl Frame {
    /// Build a frame from raw parts. At least one part is required.
    pub fn from_parts(parts: Vec<Bytes>) -> Result<Self, ProtocolError> {
        if parts.is_empty() {
            return Err(ProtocolError::EmptyFrame);
        }
        for part in &parts {
            Self::check_part_len(part.len())?;
        }
        Ok(Self { parts })
    }

    /// Topic-only frame (e.g. a confirmation event with no payload).
    pub fn tag_only(topic: &[u8]) -> Self {
        Self {
            parts: vec![Bytes::copy_from_slice(topic)],
        }
    }

    /// Topic + payload frame.
    pub fn tagged(topic: &[u8], payload: impl Into<Bytes>) -> Self {
        Self {
            parts: vec![Bytes::copy_from_slice(topic), payload.into()],
        }
    }

    pub fn parts(&self) -> &[Bytes] {
        &self.parts
    }

    /// The topic tag (part 0).
    pub fn topic(&self) -> &[u8] {
        &self.parts[0]
    }

    /// The payload (part 1), if the frame has one.
    pub fn payload(&self) -> Option<&[u8]> {
        self.parts.get(1).map(|p| p.as_ref())
    }

    /// Validate a part length against [`MAX_PART_LEN`].
    pub fn check_part_len(len: usize) -> Result<(), ProtocolError> {
        if len > MAX_PART_LEN {
            return Err(ProtocolError::PartTooLarge {
                len,
                max: MAX_PART_LEN,
            });
        }
        Ok(())
    }

    /// Encode to the wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let total: usize = self.parts.iter().map(|p| 4 + p.len()).sum();
        let mut buf = BytesMut::with_capacity(1 + total);
        buf.put_u8(self.parts.len() as u8);
        for part in &self.parts {
            buf.put_u32_le(part.len() as u32);
            buf.put_slice(part);
        }
        buf.to_vec()
    }

    /// Decode a complete frame from a buffer.
    ///
    /// Used by tests and harnesses that capture whole frames; the live
    /// transport reads the same layout incrementally from the socket.
    pub fn decode(mut buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.is_empty() {
            return Err(ProtocolError::EmptyFrame);
        }
        let count = buf.get_u8() as usize;
        if count == 0 {
            return Err(ProtocolError::EmptyFrame);
        }

        let mut parts = Vec::with_capacity(count);
        for read in 0..count {
            if buf.remaining() < 4 {
                return Err(ProtocolError::Truncated {
                    expected: count,
                    actual: read,
                });
            }
            let len = buf.get_u32_le() as usize;
            Self::check_part_len(len)?;
            if buf.remaining() < len {
                return Err(ProtocolError::Truncated {
                    expected: count,
                    actual: read,
                });
            }
            parts.push(Bytes::copy_from_slice(&buf[..len]));
            buf.advance(len);
        }

        Ok(Self { parts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_single_part() {
        let frame = Frame::tag_only(b"RESETOK");
        let decoded = Frame::decode(&frame.encode()).expect("decode");
        assert_eq!(decoded, frame);
        assert_eq!(decoded.topic(), b"RESETOK");
        assert!(decoded.payload().is_none());
    }

    #[test]
    fn test_roundtrip_topic_and_payload() {
        let frame = Frame::tagged(b"ECHO", Bytes::from_static(b"Unknown command: XYZ"));
        let decoded = Frame::decode(&frame.encode()).expect("decode");
        assert_eq!(decoded.topic(), b"ECHO");
        assert_eq!(decoded.payload(), Some(&b"Unknown command: XYZ"[..]));
    }

    #[test]
    fn test_rejects_empty_frame() {
        assert!(matches!(
            Frame::decode(&[0u8]),
            Err(ProtocolError::EmptyFrame)
        ));
        assert!(matches!(Frame::decode(&[]), Err(ProtocolError::EmptyFrame)));
    }

    #[test]
    fn test_rejects_truncated_part() {
        let mut encoded = Frame::tagged(b"ECHO", Bytes::from_static(b"hello")).encode();
        encoded.truncate(encoded.len() - 3);
        assert!(matches!(
            Frame::decode(&encoded),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_parts() {
        // Announces two parts but only carries one.
        let mut buf = vec![2u8];
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(b"ECHO");
        assert!(matches!(
            Frame::decode(&buf),
            Err(ProtocolError::Truncated {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_rejects_oversized_part() {
        let mut buf = vec![1u8];
        buf.extend_from_slice(&((MAX_PART_LEN as u32) + 1).to_le_bytes());
        assert!(matches!(
            Frame::decode(&buf),
            Err(ProtocolError::PartTooLarge { .. })
        ));
    }

    #[test]
    fn test_from_parts_validates() {
        assert!(matches!(
            Frame::from_parts(vec![]),
            Err(ProtocolError::EmptyFrame)
        ));
        assert!(Frame::from_parts(vec![Bytes::from_static(b"SIMDATA")]).is_ok());
    }
}
