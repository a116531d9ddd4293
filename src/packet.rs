//! Packets handed to subscribers and the framing vocabulary shared by the
//! dispatchers.

use std::time::Instant;

use bytes::Bytes;

use crate::protocol::{binary_header::BinaryHeader, fb::FbHeader};

/// First byte of each wire grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncByte {
    /// `$`, an ASCII sentence.
    Ascii,
    /// `0xFA`, a single-frame binary packet.
    Fa,
    /// `0xFB`, one fragment of a split binary packet.
    Fb,
    /// Bytes that belong to no packet.
    None,
}

impl SyncByte {
    /// Byte value announcing the grammar; `0` for [`SyncByte::None`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Ascii => b'$',
            Self::Fa => 0xFA,
            Self::Fb => 0xFB,
            Self::None => 0,
        }
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Fa => "fa",
            Self::Fb => "fb",
            Self::None => "none",
        }
    }
}

/// Three-way outcome of looking for a packet at a sync byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validity {
    /// A complete packet with a correct checksum starts at the sync byte.
    Valid,
    /// The bytes at the sync byte can never form a packet.
    Invalid,
    /// More bytes are needed to decide.
    Incomplete,
}

/// Result of `find_packet`.
///
/// `length` is the total packet length for [`Validity::Valid`], the number of
/// bytes needed from the sync byte for [`Validity::Incomplete`], and
/// unspecified for [`Validity::Invalid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FindPacket {
    /// Outcome of the search.
    pub validity: Validity,
    /// Length associated with the outcome.
    pub length: usize,
}

impl FindPacket {
    /// A complete packet of `length` bytes.
    #[must_use]
    pub const fn valid(length: usize) -> Self {
        Self {
            validity: Validity::Valid,
            length,
        }
    }

    /// Bytes that can never form a packet.
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            validity: Validity::Invalid,
            length: 0,
        }
    }

    /// A packet needing at least `length` bytes from the sync byte.
    #[must_use]
    pub const fn incomplete(length: usize) -> Self {
        Self {
            validity: Validity::Incomplete,
            length,
        }
    }
}

/// Metadata of bytes the router skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMetadata {
    /// Number of bytes skipped.
    pub length: usize,
    /// When the bytes were flushed.
    pub timestamp: Instant,
}

/// Metadata of an ASCII sentence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsciiMetadata {
    /// First comma-separated token without the `$`, e.g. `VNYPR`.
    pub header: String,
    /// Length of the sentence including `$` and `\r\n`.
    pub length: usize,
    /// When the sentence was framed.
    pub timestamp: Instant,
}

/// Metadata of an FA packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaMetadata {
    /// Parsed binary header.
    pub header: BinaryHeader,
    /// Length of the packet including sync byte and CRC.
    pub length: usize,
    /// When the packet was framed.
    pub timestamp: Instant,
}

/// Metadata of an FB fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FbMetadata {
    /// Parsed fragment header.
    pub header: FbHeader,
    /// Length of the fragment including sync byte and CRC.
    pub length: usize,
    /// When the fragment was framed.
    pub timestamp: Instant,
}

/// Framing-specific metadata carried with a packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PacketDetails {
    /// Skipped bytes.
    None(RawMetadata),
    /// An ASCII sentence.
    Ascii(AsciiMetadata),
    /// An FA packet, possibly reassembled from FB fragments.
    Fa(FaMetadata),
    /// One FB fragment.
    Fb(FbMetadata),
}

impl PacketDetails {
    /// Grammar the packet was framed with.
    #[must_use]
    pub const fn sync_byte(&self) -> SyncByte {
        match self {
            Self::None(_) => SyncByte::None,
            Self::Ascii(_) => SyncByte::Ascii,
            Self::Fa(_) => SyncByte::Fa,
            Self::Fb(_) => SyncByte::Fb,
        }
    }

    /// Length recorded in the metadata.
    #[must_use]
    pub const fn length(&self) -> usize {
        match self {
            Self::None(meta) => meta.length,
            Self::Ascii(meta) => meta.length,
            Self::Fa(meta) => meta.length,
            Self::Fb(meta) => meta.length,
        }
    }
}

/// An owned copy of a framed packet delivered to a subscriber.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Framing metadata.
    pub details: PacketDetails,
    /// Every byte of the packet from the sync byte through the terminator or
    /// CRC.
    pub bytes: Bytes,
}

impl Packet {
    /// Grammar the packet was framed with.
    #[must_use]
    pub const fn sync_byte(&self) -> SyncByte { self.details.sync_byte() }

    /// Packet bytes as a slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    /// ASCII header when the packet is a sentence.
    #[must_use]
    pub fn ascii_header(&self) -> Option<&str> {
        match &self.details {
            PacketDetails::Ascii(meta) => Some(&meta.header),
            _ => None,
        }
    }
}
