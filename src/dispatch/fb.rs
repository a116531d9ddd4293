use std::{sync::Arc, time::Instant};

use bytes::Bytes;
use tracing::{debug, warn};

use super::{FaPacketDispatcher, PacketDispatcher};
use crate::{
    ByteBuffer,
    Error,
    FbMetadata,
    FindPacket,
    Packet,
    PacketDetails,
    Result,
    SyncByte,
    Validity,
    byte_order::write_crc,
    checksum::crc16,
    protocol::{Scan, fa, fb},
    subscription::{FbFilter, SubscriberList},
};

/// Dispatcher for `0xFB` fragments.
///
/// Fragments of one message are concatenated behind a synthetic `0xFA` in a
/// scratch buffer. When the final fragment arrives a CRC is appended and the
/// result is framed and dispatched as an FA packet. Only one message is
/// reassembled at a time; a fragment that does not continue it discards the
/// partial message.
#[derive(Debug)]
pub struct FbPacketDispatcher {
    subscribers: Arc<SubscriberList<FbFilter>>,
    scratch: ByteBuffer,
    max_length: usize,
    latest: Option<FbMetadata>,
    previous: Option<FbMetadata>,
}

impl FbPacketDispatcher {
    /// Create a dispatcher reassembling into a scratch buffer of
    /// `scratch_capacity` bytes and rejecting fragments longer than
    /// `max_length`.
    #[must_use]
    pub fn new(
        subscribers: Arc<SubscriberList<FbFilter>>,
        scratch_capacity: usize,
        max_length: usize,
    ) -> Self {
        Self {
            subscribers,
            scratch: ByteBuffer::new(scratch_capacity),
            max_length,
            latest: None,
            previous: None,
        }
    }

    /// Deliver the fragment found by the last successful search and continue
    /// reassembly, handing a completed message to `fa`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReceivedUnexpectedMessage`] for a fragment out of
    /// sequence, [`Error::ReceivedByteBufferFull`] when the message outgrows
    /// the scratch buffer, [`Error::ParsingFailed`] when the reassembled bytes
    /// are not an FA packet, and otherwise the last subscriber failure.
    pub fn dispatch_packet(
        &mut self,
        buffer: &ByteBuffer,
        sync_index: usize,
        fa: &mut FaPacketDispatcher,
    ) -> Result<()> {
        let Some(meta) = self.latest.take() else {
            return Ok(());
        };
        let mut bytes = vec![0; meta.length];
        buffer.peek_unchecked(&mut bytes, sync_index);
        let header = meta.header;
        let fragment = Packet {
            details: PacketDetails::Fb(meta.clone()),
            bytes: Bytes::from(bytes),
        };
        let mut outcome = self.subscribers.publish(&fragment, |filter| filter.packet);

        let continues = self.previous.as_ref().is_some_and(|previous| {
            previous.header.message_id == header.message_id
                && header.current_packet_count == previous.header.current_packet_count + 1
        });
        if header.current_packet_count != 1 && !continues {
            warn!(
                message_id = header.message_id,
                current = header.current_packet_count,
                total = header.total_packet_count,
                "fragment out of sequence"
            );
            self.abandon();
            return Err(Error::ReceivedUnexpectedMessage);
        }
        if header.current_packet_count == 1 {
            self.scratch.reset();
            self.scratch.put(&[fa::SYNC])?;
        }

        let payload_start = sync_index + 1 + fb::HEADER_LEN;
        let mut payload = vec![0; usize::from(header.payload_length)];
        buffer.peek_unchecked(&mut payload, payload_start);
        if let Err(error) = self.scratch.put(&payload) {
            self.abandon();
            return Err(error);
        }

        if !header.is_final() {
            self.previous = Some(meta);
            return outcome;
        }

        if let Err(error) = self.complete(fa) {
            outcome = Err(error);
        }
        self.scratch.reset();
        self.previous = Some(meta);
        debug!(message_id = header.message_id, "fragmented message complete");
        outcome
    }

    fn complete(&mut self, fa: &mut FaPacketDispatcher) -> Result<()> {
        let body = self.scratch.to_vec();
        let crc = crc16(body.get(1..).unwrap_or_default());
        self.scratch.put(&write_crc(crc))?;

        let found = fa.find_packet_in(&self.scratch, 0, self.scratch.capacity());
        if found.validity != Validity::Valid {
            return Err(Error::ParsingFailed);
        }
        let mut outcome = Ok(());
        if let Some(packet) = fa.latest_packet(&self.scratch, 0)? {
            outcome = self
                .subscribers
                .publish(&packet, |filter| filter.completed_fa_message);
        }
        if let Err(error) = fa.dispatch_packet(&self.scratch, 0) {
            outcome = Err(error);
        }
        outcome
    }

    fn abandon(&mut self) {
        self.scratch.reset();
        self.previous = None;
    }
}

impl PacketDispatcher for FbPacketDispatcher {
    fn sync_byte(&self) -> SyncByte { SyncByte::Fb }

    fn find_packet(&mut self, buffer: &ByteBuffer, sync_index: usize) -> FindPacket {
        match fb::find_packet(buffer, sync_index, self.max_length) {
            Scan::Found(frame) => {
                self.latest = Some(FbMetadata {
                    header: frame.header,
                    length: frame.length,
                    timestamp: Instant::now(),
                });
                FindPacket::valid(frame.length)
            }
            Scan::Incomplete(needed) => FindPacket::incomplete(needed),
            Scan::Invalid => FindPacket::invalid(),
        }
    }

    fn reset(&mut self) {
        self.latest = None;
        self.abandon();
    }
}
