//! Wire grammars multiplexed on the device byte stream.
//!
//! Each submodule exposes a `find_packet` that decides, from a sync byte
//! position, whether a complete and checksum-correct packet is present. The
//! functions read through [`ByteSource`] so they run unchanged against the
//! live [`ByteBuffer`](crate::ByteBuffer), the FB reassembly scratch buffer,
//! or a plain slice.

pub mod ascii;
pub mod binary_header;
pub mod fa;
pub mod fb;

use crate::{ByteBuffer, checksum::crc16_step};

/// Outcome of scanning a grammar element that may not be fully buffered yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scan<T> {
    /// The element was read.
    Found(T),
    /// At least this many bytes, counted from the sync byte, are needed.
    Incomplete(usize),
    /// The bytes can never form the element.
    Invalid,
}

/// Random access to buffered bytes.
pub trait ByteSource {
    /// Byte at `index`, if held.
    fn byte_at(&self, index: usize) -> Option<u8>;

    /// Number of bytes held.
    fn available(&self) -> usize;

    /// Little-endian `u16` at `index`, if both bytes are held.
    fn le_u16_at(&self, index: usize) -> Option<u16> {
        let low = self.byte_at(index)?;
        let high = self.byte_at(index + 1)?;
        Some(crate::byte_order::read_le_u16([low, high]))
    }

    /// Copy of `count` bytes starting at `start`, or `None` when any of them
    /// is missing.
    fn bytes_at(&self, start: usize, count: usize) -> Option<Vec<u8>> {
        (start..start + count).map(|index| self.byte_at(index)).collect()
    }

    /// CRC-16 over `count` bytes starting at `start`, or `None` when any of
    /// them is missing.
    fn crc16_over(&self, start: usize, count: usize) -> Option<u16> {
        (start..start + count).try_fold(0, |crc, index| {
            self.byte_at(index).map(|byte| crc16_step(crc, byte))
        })
    }
}

impl ByteSource for ByteBuffer {
    fn byte_at(&self, index: usize) -> Option<u8> { self.peek(index) }

    fn available(&self) -> usize { self.len() }

    fn bytes_at(&self, start: usize, count: usize) -> Option<Vec<u8>> {
        self.copy_range(start, count).ok()
    }
}

impl ByteSource for [u8] {
    fn byte_at(&self, index: usize) -> Option<u8> { self.get(index).copied() }

    fn available(&self) -> usize { self.len() }

    fn bytes_at(&self, start: usize, count: usize) -> Option<Vec<u8>> {
        self.get(start..start.checked_add(count)?).map(<[u8]>::to_vec)
    }
}
