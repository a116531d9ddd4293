//! Bounded packet queues owned by subscribers.

use tokio::sync::mpsc;

use crate::{Error, Packet, Result};

/// Receiving half of a [`PacketQueue`].
pub type PacketReceiver = mpsc::Receiver<Packet>;

/// Sending half of a subscriber queue, registered with a dispatcher.
///
/// Pushes never wait: a full queue drops the packet and reports
/// [`Error::PacketQueueFull`]. An optional slot size bounds the length of a
/// single packet; longer packets report [`Error::PacketQueueOverrun`].
#[derive(Clone, Debug)]
pub struct PacketQueue {
    sender: mpsc::Sender<Packet>,
    slot_capacity: Option<usize>,
}

impl PacketQueue {
    /// Create a queue holding up to `capacity` packets.
    ///
    /// A zero `capacity` is raised to one.
    ///
    /// # Examples
    ///
    /// ```
    /// use vnframe::subscription::PacketQueue;
    ///
    /// let (queue, receiver) = PacketQueue::bounded(8);
    /// assert!(queue.is_open());
    /// drop(receiver);
    /// assert!(!queue.is_open());
    /// ```
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, PacketReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                slot_capacity: None,
            },
            receiver,
        )
    }

    /// Reject packets longer than `bytes`.
    #[must_use]
    pub fn with_slot_capacity(mut self, bytes: usize) -> Self {
        self.slot_capacity = Some(bytes);
        self
    }

    /// Whether the receiving half is still alive.
    #[must_use]
    pub fn is_open(&self) -> bool { !self.sender.is_closed() }

    /// Whether `other` feeds the same receiver.
    #[must_use]
    pub fn same_queue(&self, other: &Self) -> bool { self.sender.same_channel(&other.sender) }

    /// Offer `packet` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PacketQueueOverrun`] when the packet exceeds the slot
    /// size, [`Error::PacketQueueFull`] when no slot is free and
    /// [`Error::PacketQueueNull`] when the receiver was dropped.
    pub fn try_push(&self, packet: Packet) -> Result<()> {
        if self
            .slot_capacity
            .is_some_and(|slot| packet.bytes.len() > slot)
        {
            return Err(Error::PacketQueueOverrun);
        }
        self.sender.try_send(packet).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => Error::PacketQueueFull,
            mpsc::error::TrySendError::Closed(_) => Error::PacketQueueNull,
        })
    }
}
