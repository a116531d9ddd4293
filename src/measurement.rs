//! Queue of decoded measurements fed by the dispatchers.
//!
//! Dispatch decodes measurement packets through a [`MeasurementDecoder`] and
//! hands the result to a [`MeasurementQueue`], whose
//! [`MeasurementQueueMode`] decides what happens when it is full.

use std::{
    collections::VecDeque,
    sync::{
        Condvar,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use bytes::Bytes;
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::debug;

use crate::{
    Error,
    Packet,
    PacketDetails,
    Result,
    protocol::{
        Scan,
        ascii,
        binary_header::{BinaryHeader, EnabledMeasurements, FieldSpan, Group},
    },
};

/// Enqueue policy applied when a measurement arrives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementQueueMode {
    /// Measurements are not decoded or queued.
    Off,
    /// A full queue evicts its oldest measurement.
    #[default]
    Force,
    /// A full queue drops the new measurement.
    Try,
    /// A full queue waits briefly for space, then drops the new measurement.
    ///
    /// Waiting only happens while a listener drives the router; otherwise
    /// this behaves as [`MeasurementQueueMode::Try`].
    Retry,
}

/// Measurement fields of one binary packet, split but not interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMeasurement {
    /// Header of the packet the fields came from.
    pub header: BinaryHeader,
    /// Field locations with their raw bytes.
    pub fields: Vec<(FieldSpan, Bytes)>,
    /// When the packet was framed.
    pub timestamp: Instant,
}

impl BinaryMeasurement {
    /// Raw bytes of field `bit` of `group`, if present.
    #[must_use]
    pub fn field(&self, group: Group, bit: u8) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(span, _)| span.group == group && span.bit == bit)
            .map(|(_, bytes)| bytes.as_ref())
    }
}

/// Fields of one ASCII measurement sentence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsciiMeasurement {
    /// Sentence header, e.g. `VNYPR`.
    pub header: String,
    /// Comma-separated values following the header.
    pub fields: Vec<String>,
    /// When the sentence was framed.
    pub timestamp: Instant,
}

/// A decoded measurement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompositeData {
    /// Fields of an FA packet, including reassembled FB messages.
    Binary(BinaryMeasurement),
    /// Fields of an ASCII measurement sentence.
    Ascii(AsciiMeasurement),
}

impl CompositeData {
    /// Whether this measurement came from the ASCII sentence `header`.
    #[must_use]
    pub fn matches_message(&self, header: &str) -> bool {
        matches!(self, Self::Ascii(meas) if meas.header == header.trim_start_matches('$'))
    }

    /// Whether this measurement came from a binary packet enabling exactly
    /// `measurements`.
    #[must_use]
    pub fn matches_measurements(&self, measurements: &EnabledMeasurements) -> bool {
        matches!(self, Self::Binary(meas) if meas.header.measurements() == measurements)
    }
}

/// Turns measurement packets into [`CompositeData`].
pub trait MeasurementDecoder: Send + Sync {
    /// Decode `packet`, or `None` when it cannot be parsed.
    fn decode(&self, packet: &Packet) -> Option<CompositeData>;
}

impl<D: MeasurementDecoder + ?Sized> MeasurementDecoder for Box<D> {
    fn decode(&self, packet: &Packet) -> Option<CompositeData> { (**self).decode(packet) }
}

/// Decoder splitting packets into raw fields without interpreting values.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawFieldDecoder;

impl MeasurementDecoder for RawFieldDecoder {
    fn decode(&self, packet: &Packet) -> Option<CompositeData> {
        match &packet.details {
            PacketDetails::Fa(meta) => {
                let Scan::Found(spans) = meta.header.fields(packet.as_bytes(), 0) else {
                    return None;
                };
                let fields = spans
                    .into_iter()
                    .map(|span| {
                        let end = span.offset + span.len;
                        (end <= packet.bytes.len())
                            .then(|| (span, packet.bytes.slice(span.offset..end)))
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(CompositeData::Binary(BinaryMeasurement {
                    header: meta.header.clone(),
                    fields,
                    timestamp: meta.timestamp,
                }))
            }
            PacketDetails::Ascii(meta) => Some(CompositeData::Ascii(AsciiMeasurement {
                header: meta.header.clone(),
                fields: ascii::fields(packet.as_bytes()),
                timestamp: meta.timestamp,
            })),
            PacketDetails::Fb(_) | PacketDetails::None(_) => None,
        }
    }
}

/// Bounded FIFO of decoded measurements.
pub struct MeasurementQueue {
    items: Mutex<VecDeque<CompositeData>>,
    capacity: usize,
    mode: MeasurementQueueMode,
    enabled: EnabledMeasurements,
    decoder: Box<dyn MeasurementDecoder>,
    retry_budget: Duration,
    waiting_allowed: AtomicBool,
    space: Condvar,
    arrived: Notify,
}

impl std::fmt::Debug for MeasurementQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementQueue")
            .field("capacity", &self.capacity)
            .field("mode", &self.mode)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl MeasurementQueue {
    /// Create a queue holding up to `capacity` measurements.
    #[must_use]
    pub fn new(capacity: usize, mode: MeasurementQueueMode) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            mode,
            enabled: EnabledMeasurements::all(),
            decoder: Box::new(RawFieldDecoder),
            retry_budget: Duration::from_millis(10),
            waiting_allowed: AtomicBool::new(false),
            space: Condvar::new(),
            arrived: Notify::new(),
        }
    }

    /// Only queue binary packets sharing a field with `enabled`.
    #[must_use]
    pub fn with_enabled(mut self, enabled: EnabledMeasurements) -> Self {
        self.enabled = enabled;
        self
    }

    /// Decode packets with `decoder`.
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl MeasurementDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Longest a [`MeasurementQueueMode::Retry`] enqueue waits for space.
    #[must_use]
    pub fn with_retry_budget(mut self, budget: Duration) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Enqueue policy in force.
    #[must_use]
    pub const fn mode(&self) -> MeasurementQueueMode { self.mode }

    /// Whether dispatch should decode measurements at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool { self.mode != MeasurementQueueMode::Off }

    /// Allow [`MeasurementQueueMode::Retry`] to wait for space.
    pub fn set_waiting_allowed(&self, allowed: bool) {
        self.waiting_allowed.store(allowed, Ordering::Release);
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<CompositeData>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decode and enqueue a binary packet carrying `measurements`.
    ///
    /// Packets sharing no field with the enabled set are ignored.
    ///
    /// # Errors
    ///
    /// See [`MeasurementQueue::push_packet`].
    pub fn push_binary(&self, packet: &Packet, measurements: &EnabledMeasurements) -> Result<()> {
        if !self.enabled.intersects(measurements) {
            return Ok(());
        }
        self.push_packet(packet)
    }

    /// Decode and enqueue `packet` under the configured mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParsingFailed`] when decoding fails and
    /// [`Error::MeasurementQueueFull`] when `Try` or `Retry` had to drop the
    /// measurement.
    pub fn push_packet(&self, packet: &Packet) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let data = self.decoder.decode(packet).ok_or(Error::ParsingFailed)?;
        self.push(data)
    }

    /// Enqueue an already decoded measurement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MeasurementQueueFull`] when `Try` or `Retry` had to
    /// drop the measurement.
    pub fn push(&self, data: CompositeData) -> Result<()> {
        let mut items = self.lock();
        if items.len() >= self.capacity {
            match self.mode {
                MeasurementQueueMode::Off => return Ok(()),
                MeasurementQueueMode::Force => {
                    items.pop_front();
                }
                MeasurementQueueMode::Try => return Err(Error::MeasurementQueueFull),
                MeasurementQueueMode::Retry => {
                    if !self.waiting_allowed.load(Ordering::Acquire) {
                        return Err(Error::MeasurementQueueFull);
                    }
                    let (guard, _) = self
                        .space
                        .wait_timeout_while(items, self.retry_budget, |items| {
                            items.len() >= self.capacity
                        })
                        .unwrap_or_else(PoisonError::into_inner);
                    items = guard;
                    if items.len() >= self.capacity {
                        debug!(capacity = self.capacity, "measurement dropped after retry");
                        return Err(Error::MeasurementQueueFull);
                    }
                }
            }
        }
        if self.capacity == 0 {
            return Err(Error::MeasurementQueueFull);
        }
        items.push_back(data);
        drop(items);
        self.arrived.notify_waiters();
        Ok(())
    }

    /// Oldest queued measurement.
    pub fn next(&self) -> Option<CompositeData> {
        let item = self.lock().pop_front();
        if item.is_some() {
            self.space.notify_one();
        }
        item
    }

    /// Newest queued measurement; older ones stay queued.
    pub fn most_recent(&self) -> Option<CompositeData> {
        let item = self.lock().pop_back();
        if item.is_some() {
            self.space.notify_one();
        }
        item
    }

    /// Wait up to `timeout` for the oldest queued measurement.
    pub async fn next_timeout(&self, timeout: Duration) -> Option<CompositeData> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let arrived = self.arrived.notified();
            if let Some(item) = self.next() {
                return Some(item);
            }
            if tokio::time::timeout_at(deadline, arrived).await.is_err() {
                return self.next();
            }
        }
    }

    /// Number of queued measurements.
    #[must_use]
    pub fn len(&self) -> usize { self.lock().len() }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    /// Drop every queued measurement.
    pub fn clear(&self) {
        self.lock().clear();
        self.space.notify_all();
    }
}
