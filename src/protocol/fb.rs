//! Fragments of split binary packets announced by `0xFB`.
//!
//! ```text
//! 0xFB | message_type u8 | message_id u8 | total:4 current:4 | payload_length u16 | payload | crc
//! ```
//!
//! The payloads of fragments `1..=total` of one message, concatenated, are an
//! FA packet without its sync byte and CRC.

use super::{ByteSource, Scan};
use crate::{
    byte_order::{write_crc, write_le_u16},
    checksum::crc16,
};

/// Sync byte of an FB fragment.
pub const SYNC: u8 = 0xFB;

/// Header bytes following the sync byte.
pub const HEADER_LEN: usize = 5;

/// Header of one FB fragment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FbHeader {
    /// Kind of message carried; split binary output uses `0`.
    pub message_type: u8,
    /// Identifier shared by every fragment of one message.
    pub message_id: u8,
    /// Number of fragments in the message, `1..=15`.
    pub total_packet_count: u8,
    /// Position of this fragment, starting at `1`.
    pub current_packet_count: u8,
    /// Payload bytes carried by this fragment.
    pub payload_length: u16,
}

impl FbHeader {
    /// Whether this fragment completes its message.
    #[must_use]
    pub const fn is_final(&self) -> bool { self.current_packet_count == self.total_packet_count }

    /// Header bytes, sync byte included.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 1 + HEADER_LEN] {
        let [low, high] = write_le_u16(self.payload_length);
        [
            SYNC,
            self.message_type,
            self.message_id,
            (self.total_packet_count << 4) | (self.current_packet_count & 0x0F),
            low,
            high,
        ]
    }
}

/// A framed FB fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FbFrame {
    /// Parsed fragment header.
    pub header: FbHeader,
    /// Total length, sync byte through CRC.
    pub length: usize,
}

/// Look for an FB fragment whose sync byte sits at `start`.
pub fn find_packet<S: ByteSource + ?Sized>(src: &S, start: usize, max_length: usize) -> Scan<FbFrame> {
    let byte = |offset: usize| src.byte_at(start + offset);
    let (Some(message_type), Some(message_id), Some(counts), Some(payload_length)) =
        (byte(1), byte(2), byte(3), src.le_u16_at(start + 4))
    else {
        return Scan::Incomplete(1 + HEADER_LEN);
    };
    let header = FbHeader {
        message_type,
        message_id,
        total_packet_count: counts >> 4,
        current_packet_count: counts & 0x0F,
        payload_length,
    };
    if header.current_packet_count == 0 || header.current_packet_count > header.total_packet_count {
        return Scan::Invalid;
    }
    let length = 1 + HEADER_LEN + usize::from(payload_length) + 2;
    if length > max_length {
        return Scan::Invalid;
    }
    if src.available() < start + length {
        return Scan::Incomplete(length);
    }
    match src.crc16_over(start + 1, length - 1) {
        Some(0) => Scan::Found(FbFrame { header, length }),
        _ => Scan::Invalid,
    }
}

/// Assemble a complete FB fragment.
///
/// `header.payload_length` is overwritten with the length of `payload`.
#[must_use]
pub fn encode(mut header: FbHeader, payload: &[u8]) -> Vec<u8> {
    header.payload_length = u16::try_from(payload.len()).unwrap_or(u16::MAX);
    let mut out = header.to_bytes().to_vec();
    out.extend_from_slice(&payload[..usize::from(header.payload_length)]);
    let crc = crc16(&out[1..]);
    out.extend_from_slice(&write_crc(crc));
    out
}
