//! Bounded circular byte buffer feeding the packet router.
//!
//! One writer appends received bytes at the tail; the router peeks at bytes
//! relative to the head and discards them once consumed. Every index is
//! checked against the live length, so a dispatcher reading past the data it
//! was handed sees `None` or an error rather than stale bytes.

use crate::{Error, Result};

/// Ring buffer of bytes with a fixed capacity.
#[derive(Clone, Debug)]
pub struct ByteBuffer {
    storage: Box<[u8]>,
    head: usize,
    len: usize,
}

impl ByteBuffer {
    /// Create an empty buffer able to hold `capacity` bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use vnframe::ByteBuffer;
    ///
    /// let mut buffer = ByteBuffer::new(4);
    /// buffer.put(b"$VN").unwrap();
    /// assert_eq!(buffer.peek(1), Some(b'V'));
    /// assert_eq!(buffer.len(), 3);
    /// ```
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Maximum number of bytes the buffer can hold.
    #[must_use]
    pub fn capacity(&self) -> usize { self.storage.len() }

    /// Number of bytes currently held.
    #[must_use]
    pub const fn len(&self) -> usize { self.len }

    /// Whether the buffer holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.len == 0 }

    /// Whether the buffer is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool { self.len == self.capacity() }

    /// Free space left in the buffer.
    #[must_use]
    pub fn remaining(&self) -> usize { self.capacity() - self.len }

    /// Append `bytes` at the tail.
    ///
    /// The append is all-or-nothing: when `bytes` does not fit nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReceivedByteBufferFull`] when fewer than
    /// `bytes.len()` bytes of space remain.
    pub fn put(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.remaining() {
            return Err(Error::ReceivedByteBufferFull);
        }
        let capacity = self.capacity();
        if capacity == 0 {
            return Ok(());
        }
        let tail = (self.head + self.len) % capacity;
        let first = bytes.len().min(capacity - tail);
        let (front, back) = bytes.split_at(first);
        self.storage[tail..tail + first].copy_from_slice(front);
        self.storage[..back.len()].copy_from_slice(back);
        self.len += bytes.len();
        Ok(())
    }

    /// Byte at `index` positions past the head, if present.
    #[must_use]
    pub fn peek(&self, index: usize) -> Option<u8> {
        (index < self.len).then(|| self.storage[self.physical(index)])
    }

    /// Copy `dst.len()` bytes starting `start` positions past the head.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAccessPrimaryBuffer`] when the requested range
    /// extends past the bytes held.
    pub fn peek_into(&self, dst: &mut [u8], start: usize) -> Result<()> {
        let end = start
            .checked_add(dst.len())
            .ok_or(Error::InvalidAccessPrimaryBuffer)?;
        if end > self.len {
            return Err(Error::InvalidAccessPrimaryBuffer);
        }
        self.copy_out(dst, start);
        Ok(())
    }

    /// Copy bytes whose range a dispatcher already validated.
    ///
    /// Only called after `find_packet` reported the range as present; an
    /// out-of-range request copies whatever part of it is held.
    pub fn peek_unchecked(&self, dst: &mut [u8], start: usize) {
        debug_assert!(start + dst.len() <= self.len, "range was validated");
        let available = self.len.saturating_sub(start).min(dst.len());
        self.copy_out(&mut dst[..available], start);
    }

    /// Copy of `count` bytes starting `start` positions past the head.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAccessPrimaryBuffer`] when the range extends
    /// past the bytes held.
    pub fn copy_range(&self, start: usize, count: usize) -> Result<Vec<u8>> {
        let mut out = vec![0; count];
        self.peek_into(&mut out, start)?;
        Ok(out)
    }

    /// Drop up to `count` bytes from the head.
    pub fn discard(&mut self, count: usize) {
        let count = count.min(self.len);
        if count == self.len {
            self.head = 0;
            self.len = 0;
            return;
        }
        self.head = self.physical(count);
        self.len -= count;
    }

    /// Drop every byte. Calling this on an empty buffer is a no-op.
    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Copy of every byte held, head first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0; self.len];
        self.copy_out(&mut out, 0);
        out
    }

    fn physical(&self, index: usize) -> usize { (self.head + index) % self.capacity() }

    fn copy_out(&self, dst: &mut [u8], start: usize) {
        if dst.is_empty() {
            return;
        }
        let capacity = self.capacity();
        let begin = self.physical(start);
        let first = dst.len().min(capacity - begin);
        let (front, back) = dst.split_at_mut(first);
        front.copy_from_slice(&self.storage[begin..begin + first]);
        let back_len = back.len();
        back.copy_from_slice(&self.storage[..back_len]);
    }
}
