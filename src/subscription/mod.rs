//! Subscriber registries consulted by the packet dispatchers.
//!
//! Each dispatcher owns one [`SubscriberList`] behind its own lock. The lock
//! covers registration and the iteration performed while dispatching, so a
//! subscriber removed from another thread never receives a packet framed
//! afterwards.

mod filter;
mod queue;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use filter::{AsciiFilter, AsciiFilterKind, BinaryFilter, BinaryFilterKind, FbFilter};
pub use queue::{PacketQueue, PacketReceiver};
use tracing::warn;

use crate::{Error, Packet, Result};

#[derive(Debug)]
struct Subscriber<F> {
    queue: PacketQueue,
    filter: F,
}

/// Bounded list of `(queue, filter)` pairs.
#[derive(Debug)]
pub struct SubscriberList<F> {
    subscribers: Mutex<Vec<Subscriber<F>>>,
    capacity: usize,
}

impl<F> SubscriberList<F> {
    /// Create a list accepting up to `capacity` subscribers.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscriber<F>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `queue` with `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageSubscriberCapacityReached`] when the list is
    /// full.
    pub fn add(&self, queue: PacketQueue, filter: F) -> Result<()> {
        let mut subscribers = self.lock();
        if subscribers.len() >= self.capacity {
            return Err(Error::MessageSubscriberCapacityReached);
        }
        subscribers.push(Subscriber { queue, filter });
        Ok(())
    }

    /// Remove every registration of `queue`.
    pub fn remove(&self, queue: &PacketQueue) {
        self.lock()
            .retain(|subscriber| !subscriber.queue.same_queue(queue));
    }

    /// Remove the registrations of `queue` whose filter satisfies `pred`.
    pub fn remove_where(&self, queue: &PacketQueue, pred: impl Fn(&F) -> bool) {
        self.lock()
            .retain(|subscriber| !(subscriber.queue.same_queue(queue) && pred(&subscriber.filter)));
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize { self.lock().len() }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    /// Push a copy of `packet` to every subscriber whose filter satisfies
    /// `matches`.
    ///
    /// Delivery continues past failing subscribers; registrations whose
    /// receiver has been dropped are pruned.
    ///
    /// # Errors
    ///
    /// Returns the last push failure, [`Error::PacketQueueFull`] or
    /// [`Error::PacketQueueOverrun`].
    pub fn publish(&self, packet: &Packet, matches: impl Fn(&F) -> bool) -> Result<()> {
        let mut outcome = Ok(());
        let mut subscribers = self.lock();
        subscribers.retain(|subscriber| {
            if !matches(&subscriber.filter) {
                return true;
            }
            match subscriber.queue.try_push(packet.clone()) {
                Ok(()) => true,
                Err(Error::PacketQueueNull) => false,
                Err(error) => {
                    warn!(
                        sync_byte = packet.sync_byte().as_str(),
                        length = packet.bytes.len(),
                        %error,
                        "dropped packet for subscriber"
                    );
                    outcome = Err(error);
                    true
                }
            }
        });
        outcome
    }
}
