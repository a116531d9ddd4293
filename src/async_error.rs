//! Side channel for errors raised outside any caller's request.
//!
//! Dispatch failures, transport failures and spontaneous `VNERR` sentences
//! land here. Each entry is consumed at most once.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use tracing::warn;

use crate::{Error, Result};

/// An error recorded on the asynchronous channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsyncError {
    /// What went wrong.
    pub error: Error,
    /// Context, such as the sentence that carried a device error.
    pub message: String,
    /// When the error was recorded.
    pub timestamp: Instant,
}

impl AsyncError {
    /// Record `error` now with `message` as context.
    #[must_use]
    pub fn new(error: Error, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            timestamp: Instant::now(),
        }
    }
}

/// Bounded FIFO of [`AsyncError`]s. When full the oldest entry is dropped.
#[derive(Debug)]
pub struct AsyncErrorQueue {
    entries: Mutex<VecDeque<AsyncError>>,
    capacity: usize,
}

impl AsyncErrorQueue {
    /// Create a queue holding up to `capacity` errors.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<AsyncError>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an error.
    pub fn push(&self, entry: AsyncError) {
        warn!(error = %entry.error, code = entry.error.code(), message = %entry.message, "async error");
        crate::metrics::inc_async_errors();
        let mut entries = self.lock();
        if self.capacity == 0 {
            return;
        }
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Oldest unconsumed error.
    pub fn next_async_error(&self) -> Option<AsyncError> { self.lock().pop_front() }

    /// Consume the oldest error and return it as `Err`.
    ///
    /// # Errors
    ///
    /// Returns the error of the oldest unconsumed entry, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use vnframe::{AsyncError, AsyncErrorQueue, Error};
    ///
    /// let queue = AsyncErrorQueue::new(4);
    /// assert_eq!(queue.throw_if_async_error(), Ok(()));
    /// queue.push(AsyncError::new(Error::HardFault, "$VNERR,01*72"));
    /// assert_eq!(queue.throw_if_async_error(), Err(Error::HardFault));
    /// assert_eq!(queue.throw_if_async_error(), Ok(()));
    /// ```
    pub fn throw_if_async_error(&self) -> Result<()> {
        self.next_async_error().map_or(Ok(()), |entry| Err(entry.error))
    }

    /// Number of unconsumed errors.
    #[must_use]
    pub fn len(&self) -> usize { self.lock().len() }

    /// Whether no error is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    /// Drop every entry recorded after `since`.
    pub fn discard_since(&self, since: Instant) {
        self.lock().retain(|entry| entry.timestamp < since);
    }
}
