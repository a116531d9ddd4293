//! Helpers for the two byte orders found on the wire.
//!
//! Binary headers and payload fields are little-endian while the trailing
//! CRC of FA and FB packets is big-endian. Keeping the conversions here scopes
//! the Clippy expectations to the conversion points.

/// Parse a little-endian `u16` header word.
///
/// # Examples
///
/// ```
/// use vnframe::byte_order::read_le_u16;
///
/// assert_eq!(read_le_u16([0x34, 0x12]), 0x1234);
/// ```
#[must_use]
pub fn read_le_u16(bytes: [u8; 2]) -> u16 { u16::from_le_bytes(bytes) }

/// Serialise a `u16` header word in little-endian order.
#[must_use]
pub fn write_le_u16(value: u16) -> [u8; 2] { value.to_le_bytes() }

/// Serialise a packet CRC in the big-endian order it is transmitted in.
///
/// # Examples
///
/// ```
/// use vnframe::byte_order::write_crc;
///
/// assert_eq!(write_crc(0x31C3), [0x31, 0xC3]);
/// ```
#[must_use]
pub fn write_crc(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Packet CRCs are transmitted most significant byte first."
    )]
    value.to_be_bytes()
}

/// Parse a big-endian packet CRC.
#[must_use]
pub fn read_crc(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Packet CRCs are transmitted most significant byte first."
    )]
    u16::from_be_bytes(bytes)
}
