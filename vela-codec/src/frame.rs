//! The 16-byte exchange frame header: magic, flags, status, message id, and
//! body length. Layout is fixed regardless of body serializer (see the data
//! model's header invariant).

use bytes::{Buf, BufMut, BytesMut};

pub const MAGIC: u16 = 0xDABB;
pub const HEADER_LEN: usize = 16;

const FLAG_REQUEST: u8 = 0b1000_0000;
const FLAG_TWO_WAY: u8 = 0b0100_0000;
const FLAG_EVENT: u8 = 0b0010_0000;
const SERIALIZER_MASK: u8 = 0b0001_1111;

pub const STATUS_OK: u8 = 20;
pub const STATUS_CLIENT_ERROR: u8 = 90;
pub const STATUS_BAD_RESPONSE: u8 = 91;

/// A parsed (or about-to-be-written) frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub request: bool,
    pub two_way: bool,
    pub event: bool,
    pub serializer_id: u8,
    /// Meaningful for responses only; always 0 on requests.
    pub status: u8,
    pub id: u64,
    pub body_len: u32,
}

impl FrameHeader {
    /// Append this header's 16 bytes to `buf`.
    pub fn write(&self, buf: &mut BytesMut) {
        buf.put_u16(MAGIC);
        let mut flags = self.serializer_id & SERIALIZER_MASK;
        if self.request {
            flags |= FLAG_REQUEST;
        }
        if self.two_way {
            flags |= FLAG_TWO_WAY;
        }
        if self.event {
            flags |= FLAG_EVENT;
        }
        buf.put_u8(flags);
        buf.put_u8(self.status);
        buf.put_u64(self.id);
        buf.put_u32(self.body_len);
    }

    /// Parse a header from the first [`HEADER_LEN`] bytes of `bytes`.
    /// Returns `None` if there aren't enough bytes or the magic doesn't match
    /// — callers are expected to have checked magic already via
    /// [`has_magic`], this is a convenience for tests and the codec's own
    /// post-magic-check path.
    pub fn read(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN || !has_magic(bytes) {
            return None;
        }
        let flags = bytes[2];
        let status = bytes[3];
        let id = u64::from_be_bytes(bytes[4..12].try_into().unwrap());
        let body_len = u32::from_be_bytes(bytes[12..16].try_into().unwrap());
        Some(Self {
            request: flags & FLAG_REQUEST != 0,
            two_way: flags & FLAG_TWO_WAY != 0,
            event: flags & FLAG_EVENT != 0,
            serializer_id: flags & SERIALIZER_MASK,
            status,
            id,
            body_len,
        })
    }
}

/// True if `bytes` starts with the frame magic. `bytes` may be shorter than
/// two bytes (returns `false`).
pub fn has_magic(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && u16::from_be_bytes([bytes[0], bytes[1]]) == MAGIC
}

/// Find the first occurrence of the magic sequence in `bytes`, if any.
pub fn find_magic(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(2)
        .position(|w| u16::from_be_bytes([w[0], w[1]]) == MAGIC)
}

/// Drop `n` bytes from the front of `buf`, as a small named wrapper around
/// `bytes::Buf::advance` for call sites that read better with a verb.
pub fn skip(buf: &mut BytesMut, n: usize) {
    buf.advance(n);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_matches_wire_bytes() {
        let header = FrameHeader {
            request: true,
            two_way: true,
            event: false,
            serializer_id: 2,
            status: 0,
            id: 42,
            body_len: 7,
        };
        let mut buf = BytesMut::new();
        header.write(&mut buf);
        assert_eq!(
            &buf[..],
            &[0xDA, 0xBB, 0xC2, 0x00, 0, 0, 0, 0, 0, 0, 0, 0x2A, 0, 0, 0, 0x07][..]
        );
    }

    #[test]
    fn read_roundtrips_write() {
        let header = FrameHeader {
            request: false,
            two_way: false,
            event: true,
            serializer_id: 5,
            status: 91,
            id: 9999,
            body_len: 123,
        };
        let mut buf = BytesMut::new();
        header.write(&mut buf);
        assert_eq!(FrameHeader::read(&buf), Some(header));
    }

    #[test]
    fn find_magic_locates_offset_within_garbage_prefix() {
        let buf = [0xAAu8, 0x55, 0xDA, 0xBB, 0x00, 0x00];
        assert_eq!(find_magic(&buf[1..]), Some(1));
    }
}
