//! Single-frame binary packets announced by `0xFA`.

use super::{ByteSource, Scan, binary_header::BinaryHeader};
use crate::{byte_order::write_crc, checksum::crc16};

/// Sync byte of an FA packet.
pub const SYNC: u8 = 0xFA;

/// Bytes following the payload.
pub const CRC_LEN: usize = 2;

/// A framed FA packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaFrame {
    /// Parsed binary header.
    pub header: BinaryHeader,
    /// Total length, sync byte through CRC.
    pub length: usize,
}

/// Look for an FA packet whose sync byte sits at `start`.
///
/// Packets longer than `max_length` are rejected as invalid. The CRC covers
/// every byte after the sync byte, so running it across the trailing CRC as
/// well must yield zero.
pub fn find_packet<S: ByteSource + ?Sized>(src: &S, start: usize, max_length: usize) -> Scan<FaFrame> {
    let header = match BinaryHeader::parse(src, start) {
        Scan::Found(header) => header,
        Scan::Incomplete(needed) if needed > max_length => return Scan::Invalid,
        Scan::Incomplete(needed) => return Scan::Incomplete(needed),
        Scan::Invalid => return Scan::Invalid,
    };
    let payload = match header.payload_length(src, start) {
        Scan::Found(payload) => payload,
        Scan::Incomplete(needed) if needed > max_length => return Scan::Invalid,
        Scan::Incomplete(needed) => return Scan::Incomplete(needed),
        Scan::Invalid => return Scan::Invalid,
    };
    let length = header.len() + payload + CRC_LEN;
    if length > max_length {
        return Scan::Invalid;
    }
    if src.available() < start + length {
        return Scan::Incomplete(length);
    }
    match src.crc16_over(start + 1, length - 1) {
        Some(0) => Scan::Found(FaFrame { header, length }),
        _ => Scan::Invalid,
    }
}

/// Assemble a complete FA packet from a header and its payload.
///
/// # Examples
///
/// ```
/// use vnframe::protocol::{
///     Scan,
///     binary_header::{BinaryHeader, EnabledMeasurements, Group},
///     fa,
/// };
///
/// let header = BinaryHeader::new(EnabledMeasurements::new().with(Group::Imu, 4));
/// let packet = fa::encode(&header, &[0, 0, 0x20, 0x41]);
/// assert!(matches!(fa::find_packet(packet.as_slice(), 0, 600), Scan::Found(_)));
/// ```
#[must_use]
pub fn encode(header: &BinaryHeader, payload: &[u8]) -> Vec<u8> {
    let mut out = header.to_bytes(SYNC);
    out.extend_from_slice(payload);
    let crc = crc16(&out[1..]);
    out.extend_from_slice(&write_crc(crc));
    out
}
