//! Packet router: finds the next packet in the live buffer and dispatches it.
//!
//! The router scans from the head of the buffer for a byte equal to a
//! dispatcher's sync byte and asks that dispatcher whether a packet starts
//! there. A valid packet is dispatched and consumed together with the bytes
//! skipped before it. An invalid candidate is passed over, so a corrupted
//! packet costs at most the bytes up to the next genuine sync byte. An
//! incomplete candidate stops the scan until enough bytes arrive.

use std::{sync::Arc, time::Instant};

use bytes::Bytes;
use tracing::debug;

use crate::{
    ByteBuffer,
    Packet,
    PacketDetails,
    RawMetadata,
    Result,
    SyncByte,
    Validity,
    async_error::{AsyncError, AsyncErrorQueue},
    dispatch::{
        AsciiPacketDispatcher,
        DispatcherKind,
        FaPacketDispatcher,
        FbPacketDispatcher,
        PacketDispatcher,
    },
    metrics,
    subscription::SubscriberList,
};

/// Valid and invalid packet counts of one dispatcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PacketCounts {
    /// Packets dispatched.
    pub valid: u64,
    /// Candidates rejected at a matching sync byte.
    pub invalid: u64,
}

/// Counters kept by the router.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// FA packets.
    pub fa: PacketCounts,
    /// ASCII sentences.
    pub ascii: PacketCounts,
    /// FB fragments.
    pub fb: PacketCounts,
    /// Bytes discarded without belonging to a packet.
    pub skipped_bytes: u64,
    /// Bytes loaded into the live buffer.
    pub received_bytes: u64,
}

impl RouterStats {
    /// Counts for the dispatcher of `sync_byte`.
    #[must_use]
    pub const fn counts(&self, sync_byte: SyncByte) -> PacketCounts {
        match sync_byte {
            SyncByte::Fa => self.fa,
            SyncByte::Ascii => self.ascii,
            SyncByte::Fb => self.fb,
            SyncByte::None => PacketCounts { valid: 0, invalid: 0 },
        }
    }

    fn counts_mut(&mut self, kind: DispatcherKind) -> &mut PacketCounts {
        match kind {
            DispatcherKind::Fa => &mut self.fa,
            DispatcherKind::Ascii => &mut self.ascii,
            DispatcherKind::Fb => &mut self.fb,
        }
    }
}

/// Routes packets from the live buffer to the dispatchers.
#[derive(Debug)]
pub struct PacketRouter {
    ascii: AsciiPacketDispatcher,
    fa: FaPacketDispatcher,
    fb: FbPacketDispatcher,
    async_errors: Arc<AsyncErrorQueue>,
    skipped: Arc<SubscriberList<()>>,
    packet_max_length: usize,
    requested: Option<usize>,
    stats: RouterStats,
}

impl PacketRouter {
    /// Assemble a router from its dispatchers.
    ///
    /// Dispatch failures are reported to `async_errors`; skipped bytes are
    /// delivered to any queue registered in `skipped`.
    #[must_use]
    pub fn new(
        ascii: AsciiPacketDispatcher,
        fa: FaPacketDispatcher,
        fb: FbPacketDispatcher,
        async_errors: Arc<AsyncErrorQueue>,
        skipped: Arc<SubscriberList<()>>,
        packet_max_length: usize,
    ) -> Self {
        Self {
            ascii,
            fa,
            fb,
            async_errors,
            skipped,
            packet_max_length,
            requested: None,
            stats: RouterStats::default(),
        }
    }

    /// Counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> RouterStats { self.stats }

    /// Record `count` bytes loaded into the live buffer.
    pub fn note_received(&mut self, count: usize) {
        self.stats.received_bytes += u64::try_from(count).unwrap_or(u64::MAX);
    }

    /// Forget per-stream state: the pending incomplete request and any
    /// partially reassembled FB message.
    pub fn reset(&mut self) {
        self.requested = None;
        self.ascii.reset();
        self.fa.reset();
        self.fb.reset();
    }

    fn find(&mut self, kind: DispatcherKind, buffer: &ByteBuffer, index: usize) -> crate::FindPacket {
        match kind {
            DispatcherKind::Fa => self.fa.find_packet(buffer, index),
            DispatcherKind::Ascii => self.ascii.find_packet(buffer, index),
            DispatcherKind::Fb => self.fb.find_packet(buffer, index),
        }
    }

    fn dispatch(&mut self, kind: DispatcherKind, buffer: &ByteBuffer, index: usize) -> Result<()> {
        match kind {
            DispatcherKind::Fa => self.fa.dispatch_packet(buffer, index),
            DispatcherKind::Ascii => self.ascii.dispatch_packet(buffer, index),
            DispatcherKind::Fb => self.fb.dispatch_packet(buffer, index, &mut self.fa),
        }
    }

    /// Find and dispatch at most one packet.
    ///
    /// Returns `true` when the buffer holds no further complete packet, so
    /// the caller should load more bytes before calling again.
    pub fn dispatch_next_packet(&mut self, buffer: &mut ByteBuffer) -> bool {
        if buffer.is_empty() {
            return true;
        }
        if self.requested.is_some_and(|requested| buffer.len() < requested) {
            return true;
        }
        self.requested = None;

        for index in 0..buffer.len() {
            let Some(byte) = buffer.peek(index) else {
                break;
            };
            for kind in DispatcherKind::ORDER {
                let sync_byte = kind.sync_byte();
                if sync_byte.value() != byte {
                    continue;
                }
                let found = self.find(kind, buffer, index);
                metrics::inc_packets(sync_byte, found.validity);
                match found.validity {
                    Validity::Valid => {
                        debug!(sync_byte = sync_byte.as_str(), length = found.length, "packet found");
                        self.stats.counts_mut(kind).valid += 1;
                        if let Err(error) = self.dispatch(kind, buffer, index) {
                            self.async_errors.push(AsyncError::new(
                                error,
                                format!("{} dispatch failed", sync_byte.as_str()),
                            ));
                        }
                        self.flush_skipped(buffer, index);
                        buffer.discard(index + found.length.max(1));
                        return false;
                    }
                    Validity::Invalid => {
                        self.stats.counts_mut(kind).invalid += 1;
                    }
                    Validity::Incomplete => {
                        if buffer.len() - index > self.packet_max_length {
                            continue;
                        }
                        self.flush_skipped(buffer, index);
                        buffer.discard(index);
                        self.requested = Some(found.length);
                        return true;
                    }
                }
            }
        }

        let len = buffer.len();
        self.flush_skipped(buffer, len);
        buffer.reset();
        true
    }

    /// Dispatch packets until the buffer needs more data.
    pub fn process_available(&mut self, buffer: &mut ByteBuffer) {
        while !self.dispatch_next_packet(buffer) {}
    }

    fn flush_skipped(&mut self, buffer: &ByteBuffer, count: usize) {
        if count == 0 {
            return;
        }
        self.stats.skipped_bytes += u64::try_from(count).unwrap_or(u64::MAX);
        metrics::add_skipped_bytes(count);
        if self.skipped.is_empty() {
            return;
        }
        let chunk = self.packet_max_length.max(1);
        for start in (0..count).step_by(chunk) {
            let len = chunk.min(count - start);
            let mut bytes = vec![0; len];
            buffer.peek_unchecked(&mut bytes, start);
            let packet = Packet {
                details: PacketDetails::None(RawMetadata {
                    length: len,
                    timestamp: Instant::now(),
                }),
                bytes: Bytes::from(bytes),
            };
            // Failures are logged by the registry; skipped bytes are best effort.
            let _ = self.skipped.publish(&packet, |_| true);
        }
    }
}
