use std::{sync::Arc, time::Instant};

use bytes::Bytes;
use tracing::debug;

use super::PacketDispatcher;
use crate::{
    AsciiMetadata,
    ByteBuffer,
    FindPacket,
    Packet,
    PacketDetails,
    Result,
    SyncByte,
    command::CommandProcessor,
    measurement::MeasurementQueue,
    protocol::{
        Scan,
        ascii::{self, ChecksumMode},
    },
    subscription::{AsciiFilter, SubscriberList},
};

/// Dispatcher for `$` sentences.
///
/// Measurement sentences and anything not starting with `VN` go to
/// subscribers; other `VN` sentences are command traffic for the
/// [`CommandProcessor`].
#[derive(Debug)]
pub struct AsciiPacketDispatcher {
    subscribers: Arc<SubscriberList<AsciiFilter>>,
    commands: Arc<CommandProcessor>,
    measurements: Option<Arc<MeasurementQueue>>,
    max_length: usize,
    checksum_mode: ChecksumMode,
    latest: Option<AsciiMetadata>,
}

impl AsciiPacketDispatcher {
    /// Create a dispatcher delivering to `subscribers` and correlating
    /// responses through `commands`.
    #[must_use]
    pub fn new(
        subscribers: Arc<SubscriberList<AsciiFilter>>,
        commands: Arc<CommandProcessor>,
        max_length: usize,
    ) -> Self {
        Self {
            subscribers,
            commands,
            measurements: None,
            max_length,
            checksum_mode: ChecksumMode::default(),
            latest: None,
        }
    }

    /// Accept only checksums of the given form.
    #[must_use]
    pub fn with_checksum_mode(mut self, mode: ChecksumMode) -> Self {
        self.checksum_mode = mode;
        self
    }

    /// Also feed measurement sentences to `queue`.
    #[must_use]
    pub fn with_measurements(mut self, queue: Arc<MeasurementQueue>) -> Self {
        self.measurements = Some(queue);
        self
    }

    /// Deliver the sentence found by the last successful
    /// [`find_packet`](PacketDispatcher::find_packet).
    ///
    /// # Errors
    ///
    /// Returns the last subscriber or measurement queue failure.
    pub fn dispatch_packet(&mut self, buffer: &ByteBuffer, sync_index: usize) -> Result<()> {
        let Some(meta) = self.latest.take() else {
            return Ok(());
        };
        let mut bytes = vec![0; meta.length];
        buffer.peek_unchecked(&mut bytes, sync_index);

        if meta.header.starts_with("VN") && !ascii::is_measurement_header(&meta.header) {
            let sentence = String::from_utf8_lossy(&bytes);
            debug!(header = %meta.header, "passing command response");
            self.commands.match_response(&sentence, &meta.header);
            return Ok(());
        }

        let measurement = meta.header.starts_with("VN");
        let packet = Packet {
            details: PacketDetails::Ascii(meta),
            bytes: Bytes::from(bytes),
        };
        let mut outcome = self.publish(&packet);
        if measurement
            && let Some(queue) = &self.measurements
            && let Err(error) = queue.push_packet(&packet)
        {
            outcome = Err(error);
        }
        outcome
    }

    fn publish(&self, packet: &Packet) -> Result<()> {
        let header = packet.ascii_header().unwrap_or_default();
        self.subscribers.publish(packet, |filter| filter.matches(header))
    }
}

impl PacketDispatcher for AsciiPacketDispatcher {
    fn sync_byte(&self) -> SyncByte { SyncByte::Ascii }

    fn find_packet(&mut self, buffer: &ByteBuffer, sync_index: usize) -> FindPacket {
        match ascii::find_packet(buffer, sync_index, self.max_length, self.checksum_mode) {
            Scan::Found(frame) => {
                let length = frame.length;
                self.latest = Some(AsciiMetadata {
                    header: frame.header,
                    length,
                    timestamp: Instant::now(),
                });
                FindPacket::valid(length)
            }
            Scan::Incomplete(needed) => FindPacket::incomplete(needed),
            Scan::Invalid => FindPacket::invalid(),
        }
    }

    fn reset(&mut self) { self.latest = None; }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};

    use super::AsciiPacketDispatcher;
    use crate::{
        ByteBuffer,
        Validity,
        async_error::AsyncErrorQueue,
        command::{CommandProcessor, CommandState, catalogue},
        dispatch::PacketDispatcher,
        measurement::{MeasurementQueue, MeasurementQueueMode},
        protocol::ascii::frame_with_checksum8,
        subscription::{AsciiFilter, PacketQueue, SubscriberList},
    };

    struct Harness {
        dispatcher: AsciiPacketDispatcher,
        subscribers: Arc<SubscriberList<AsciiFilter>>,
        commands: Arc<CommandProcessor>,
        measurements: Arc<MeasurementQueue>,
    }

    #[fixture]
    fn harness() -> Harness {
        let subscribers = Arc::new(SubscriberList::new(4));
        let commands = Arc::new(CommandProcessor::new(4, Arc::new(AsyncErrorQueue::new(4))));
        let measurements = Arc::new(MeasurementQueue::new(4, MeasurementQueueMode::Force));
        let dispatcher =
            AsciiPacketDispatcher::new(Arc::clone(&subscribers), Arc::clone(&commands), 256)
                .with_measurements(Arc::clone(&measurements));
        Harness {
            dispatcher,
            subscribers,
            commands,
            measurements,
        }
    }

    fn load(sentence: &str) -> ByteBuffer {
        let mut buffer = ByteBuffer::new(512);
        buffer.put(sentence.as_bytes()).unwrap();
        buffer
    }

    fn dispatch(harness: &mut Harness, sentence: &str) {
        let buffer = load(sentence);
        let found = harness.dispatcher.find_packet(&buffer, 0);
        assert_eq!(found.validity, Validity::Valid);
        harness.dispatcher.dispatch_packet(&buffer, 0).unwrap();
    }

    #[rstest]
    fn measurements_reach_subscribers_and_queue(mut harness: Harness) {
        let (queue, mut rx) = PacketQueue::bounded(4);
        harness
            .subscribers
            .add(queue, AsciiFilter::starts_with("VNYPR"))
            .unwrap();
        dispatch(&mut harness, &frame_with_checksum8("VNYPR,1,2,3"));
        let packet = rx.try_recv().unwrap();
        assert_eq!(packet.ascii_header(), Some("VNYPR"));
        assert!(harness.measurements.next().unwrap().matches_message("$VNYPR"));
    }

    #[rstest]
    fn command_responses_bypass_subscribers(mut harness: Harness) {
        let (queue, mut rx) = PacketQueue::bounded(4);
        harness.subscribers.add(queue, AsciiFilter::default()).unwrap();
        let command = Arc::new(catalogue::read_register(1));
        harness.commands.register(&command).unwrap();

        dispatch(&mut harness, &frame_with_checksum8("VNRRG,01,VN-300"));

        assert!(rx.try_recv().is_err());
        assert!(matches!(command.state(), CommandState::Completed(_)));
    }

    #[rstest]
    fn foreign_sentences_reach_subscribers_only(mut harness: Harness) {
        let (queue, mut rx) = PacketQueue::bounded(4);
        harness
            .subscribers
            .add(queue, AsciiFilter::does_not_start_with("VN"))
            .unwrap();
        dispatch(&mut harness, &frame_with_checksum8("GPGGA,1"));
        assert_eq!(rx.try_recv().unwrap().ascii_header(), Some("GPGGA"));
        assert!(harness.measurements.is_empty());
    }
}
