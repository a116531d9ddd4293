//! Checksum and CRC helpers shared by the ASCII and binary grammars.

/// 8-bit XOR checksum used by ASCII sentences.
///
/// # Examples
///
/// ```
/// use vnframe::checksum::checksum8;
///
/// assert_eq!(checksum8(b"AB"), 0x03);
/// assert_eq!(checksum8(&[]), 0);
/// ```
#[must_use]
pub fn checksum8(bytes: &[u8]) -> u8 { bytes.iter().fold(0, |acc, &byte| acc ^ byte) }

/// CRC-16 (CCITT polynomial, zero seed) used by binary packets and optionally
/// by ASCII sentences.
///
/// Running it over a packet body followed by its big-endian CRC yields zero.
#[must_use]
pub fn crc16(bytes: &[u8]) -> u16 { bytes.iter().fold(0, |crc, &byte| crc16_step(crc, byte)) }

/// Fold a single byte into a running CRC.
#[must_use]
pub const fn crc16_step(crc: u16, byte: u8) -> u16 {
    let mut crc = crc.rotate_left(8);
    crc ^= byte as u16;
    crc ^= (crc & 0xFF) >> 4;
    crc ^= crc << 12;
    crc ^= (crc & 0xFF) << 5;
    crc
}
