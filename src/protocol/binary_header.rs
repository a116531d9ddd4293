//! Binary output header shared by FA packets and reassembled FB messages.
//!
//! ```text
//! sync | groups u8 [| ext groups u8] | per group: types u16 [| ext types u16] | payload | crc
//! ```
//!
//! Bit 7 of the groups byte and bit 15 of a types word announce an extension.
//! The payload is the concatenation of every enabled field, group by group and
//! bit by bit, with sizes taken from a fixed table.

use super::{ByteSource, Scan};

/// Number of output groups the header can enable.
pub const GROUP_COUNT: usize = 8;

/// An output group of the binary header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Group {
    /// Measurements common to every product.
    Common,
    /// Time and synchronisation.
    Time,
    /// Inertial sensor outputs.
    Imu,
    /// Primary GNSS receiver.
    Gnss,
    /// Attitude solution.
    Attitude,
    /// Inertial navigation solution.
    Ins,
    /// Secondary GNSS receiver.
    Gnss2,
    /// Tertiary GNSS receiver, enabled through the extension groups byte.
    Gnss3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldSize {
    Fixed(usize),
    /// Satellite info: count at offset 0, 2 header bytes then 8 per satellite.
    SatInfo,
    /// Raw measurements: count at offset 10, 12 header bytes then 28 each.
    RawMeas,
    Reserved,
}

use FieldSize::{Fixed as F, RawMeas, Reserved as R, SatInfo};

const COMMON: &[FieldSize] = &[
    F(8), F(8), F(8), F(12), F(16), F(12), F(24), F(12), F(12), F(24), F(20), F(28), F(2), F(4),
    F(8),
];
const TIME: &[FieldSize] = &[F(8), F(8), F(8), F(2), F(8), F(8), F(8), F(4), F(4), F(1)];
const IMU: &[FieldSize] = &[
    F(2), F(12), F(12), F(12), F(4), F(4), F(16), F(12), F(12), F(12), F(12), F(2),
];
const GNSS: &[FieldSize] = &[
    F(8), F(8), F(2), F(1), F(1), F(24), F(24), F(12), F(12), F(12), F(4), F(4), F(2), F(28),
    SatInfo, RawMeas,
];
const ATTITUDE: &[FieldSize] = &[
    F(2), F(12), F(16), F(36), F(12), F(12), F(12), F(12), F(12), R, R, R, R, R, R, F(12),
];
const INS: &[FieldSize] = &[
    F(2), F(24), F(24), F(12), F(12), F(12), F(12), F(12), F(12), F(4), F(4),
];

impl Group {
    /// Every group in wire order.
    pub const ALL: [Self; GROUP_COUNT] = [
        Self::Common,
        Self::Time,
        Self::Imu,
        Self::Gnss,
        Self::Attitude,
        Self::Ins,
        Self::Gnss2,
        Self::Gnss3,
    ];

    /// Position of the group in the combined groups bitmask.
    #[must_use]
    pub const fn index(self) -> usize { self as usize }

    fn fields(self) -> &'static [FieldSize] {
        match self {
            Self::Common => COMMON,
            Self::Time => TIME,
            Self::Imu => IMU,
            Self::Gnss | Self::Gnss2 | Self::Gnss3 => GNSS,
            Self::Attitude => ATTITUDE,
            Self::Ins => INS,
        }
    }

    /// Mask of every field bit defined for the group.
    #[must_use]
    pub fn known_fields(self) -> u32 {
        self.fields()
            .iter()
            .enumerate()
            .filter(|(_, size)| **size != FieldSize::Reserved)
            .fold(0, |mask, (bit, _)| mask | (1 << bit))
    }
}

/// Set of enabled measurement fields, one type mask per group.
///
/// Bits 0..=14 of a mask come from the first types word of the group and bits
/// 15..=29 from its extension word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EnabledMeasurements([u32; GROUP_COUNT]);

impl EnabledMeasurements {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self { Self([0; GROUP_COUNT]) }

    /// Every field the header grammar knows about.
    #[must_use]
    pub fn all() -> Self {
        let mut out = Self::new();
        for group in Group::ALL {
            out.0[group.index()] = group.known_fields();
        }
        out
    }

    /// Builder-style variant of [`EnabledMeasurements::set`].
    ///
    /// # Examples
    ///
    /// ```
    /// use vnframe::protocol::binary_header::{EnabledMeasurements, Group};
    ///
    /// let ypr = EnabledMeasurements::new().with(Group::Common, 3);
    /// assert!(ypr.is_set(Group::Common, 3));
    /// assert!(!ypr.is_set(Group::Imu, 3));
    /// ```
    #[must_use]
    pub fn with(mut self, group: Group, bit: u8) -> Self {
        self.set(group, bit);
        self
    }

    /// Enable field `bit` of `group`. Bits above 29 are ignored.
    pub fn set(&mut self, group: Group, bit: u8) {
        if bit < 30 {
            self.0[group.index()] |= 1 << bit;
        }
    }

    /// Whether field `bit` of `group` is enabled.
    #[must_use]
    pub fn is_set(&self, group: Group, bit: u8) -> bool {
        bit < 30 && self.0[group.index()] & (1 << bit) != 0
    }

    /// Type mask of `group`.
    #[must_use]
    pub const fn group_mask(&self, group: Group) -> u32 { self.0[group as usize] }

    /// Whether no field is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.iter().all(|mask| *mask == 0) }

    /// Whether the two sets share at least one field.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| a & b != 0)
    }

    /// Groups with at least one enabled field, in wire order.
    pub fn groups(&self) -> impl Iterator<Item = Group> + '_ {
        Group::ALL
            .into_iter()
            .filter(|group| self.0[group.index()] != 0)
    }
}

/// Parsed binary header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryHeader {
    measurements: EnabledMeasurements,
    length: usize,
}

impl BinaryHeader {
    /// Build a header enabling `measurements`.
    #[must_use]
    pub fn new(measurements: EnabledMeasurements) -> Self {
        let length = 2
            + usize::from(measurements.group_mask(Group::Gnss3) != 0)
            + measurements
                .groups()
                .map(|group| if measurements.group_mask(group) >> 15 == 0 { 2 } else { 4 })
                .sum::<usize>();
        Self {
            measurements,
            length,
        }
    }

    /// Fields announced by the header.
    #[must_use]
    pub const fn measurements(&self) -> &EnabledMeasurements { &self.measurements }

    /// Header length including the sync byte.
    #[must_use]
    pub const fn len(&self) -> usize { self.length }

    /// Headers always hold at least the sync and groups bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool { false }

    /// Parse the header of the packet whose sync byte is at `start`.
    pub fn parse<S: ByteSource + ?Sized>(src: &S, start: usize) -> Scan<Self> {
        let mut cursor = start + 1;
        let Some(first) = src.byte_at(cursor) else {
            return Scan::Incomplete(cursor + 1 - start);
        };
        cursor += 1;
        let mut groups = u16::from(first & 0x7F);
        if first & 0x80 != 0 {
            let Some(ext) = src.byte_at(cursor) else {
                return Scan::Incomplete(cursor + 1 - start);
            };
            cursor += 1;
            if ext & 0x80 != 0 {
                return Scan::Invalid;
            }
            groups |= u16::from(ext) << 7;
        }
        if groups == 0 || groups >> GROUP_COUNT != 0 {
            return Scan::Invalid;
        }

        let mut measurements = EnabledMeasurements::new();
        for group in Group::ALL {
            if groups & (1 << group.index()) == 0 {
                continue;
            }
            let Some(word) = src.le_u16_at(cursor) else {
                return Scan::Incomplete(cursor + 2 - start);
            };
            cursor += 2;
            let mut mask = u32::from(word & 0x7FFF);
            if word & 0x8000 != 0 {
                let Some(ext) = src.le_u16_at(cursor) else {
                    return Scan::Incomplete(cursor + 2 - start);
                };
                cursor += 2;
                if ext & 0x8000 != 0 {
                    return Scan::Invalid;
                }
                mask |= u32::from(ext) << 15;
            }
            if mask == 0 || mask & !group.known_fields() != 0 {
                return Scan::Invalid;
            }
            measurements.0[group.index()] = mask;
        }

        Scan::Found(Self {
            measurements,
            length: cursor - start,
        })
    }

    /// Serialise the header, sync byte included.
    #[must_use]
    pub fn to_bytes(&self, sync: u8) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length);
        out.push(sync);
        let groups = self
            .measurements
            .groups()
            .fold(0u16, |acc, group| acc | (1 << group.index()));
        let low = (groups & 0x7F) as u8;
        let high = (groups >> 7) as u8;
        if high == 0 {
            out.push(low);
        } else {
            out.push(low | 0x80);
            out.push(high);
        }
        for group in self.measurements.groups() {
            let mask = self.measurements.group_mask(group);
            let word = (mask & 0x7FFF) as u16;
            let ext = (mask >> 15) as u16;
            if ext == 0 {
                out.extend_from_slice(&crate::byte_order::write_le_u16(word));
            } else {
                out.extend_from_slice(&crate::byte_order::write_le_u16(word | 0x8000));
                out.extend_from_slice(&crate::byte_order::write_le_u16(ext));
            }
        }
        out
    }

    /// Byte ranges of every enabled field, relative to the sync byte at
    /// `start`.
    ///
    /// Variable-length fields read their element count from `src`; while it is
    /// not buffered the result is [`Scan::Incomplete`].
    pub fn fields<S: ByteSource + ?Sized>(&self, src: &S, start: usize) -> Scan<Vec<FieldSpan>> {
        let mut spans = Vec::new();
        let mut offset = self.length;
        for group in self.measurements.groups() {
            let mask = self.measurements.group_mask(group);
            for (bit, size) in (0u8..).zip(group.fields()) {
                if mask & (1 << bit) == 0 {
                    continue;
                }
                let len = match *size {
                    FieldSize::Fixed(len) => len,
                    FieldSize::SatInfo => match src.byte_at(start + offset) {
                        Some(count) => 2 + 8 * usize::from(count),
                        None => return Scan::Incomplete(offset + 1),
                    },
                    FieldSize::RawMeas => match src.byte_at(start + offset + 10) {
                        Some(count) => 12 + 28 * usize::from(count),
                        None => return Scan::Incomplete(offset + 11),
                    },
                    FieldSize::Reserved => return Scan::Invalid,
                };
                spans.push(FieldSpan {
                    group,
                    bit,
                    offset,
                    len,
                });
                offset += len;
            }
        }
        Scan::Found(spans)
    }

    /// Payload length of the packet whose sync byte is at `start`.
    pub fn payload_length<S: ByteSource + ?Sized>(&self, src: &S, start: usize) -> Scan<usize> {
        match self.fields(src, start) {
            Scan::Found(spans) => Scan::Found(spans.iter().map(|span| span.len).sum()),
            Scan::Incomplete(needed) => Scan::Incomplete(needed),
            Scan::Invalid => Scan::Invalid,
        }
    }
}

/// Location of one measurement field inside a binary packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpan {
    /// Output group of the field.
    pub group: Group,
    /// Bit of the field within its group.
    pub bit: u8,
    /// Offset from the sync byte.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
}
