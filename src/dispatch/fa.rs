use std::{sync::Arc, time::Instant};

use bytes::Bytes;

use super::PacketDispatcher;
use crate::{
    ByteBuffer,
    Error,
    FaMetadata,
    FindPacket,
    Packet,
    PacketDetails,
    Result,
    SyncByte,
    measurement::MeasurementQueue,
    protocol::{ByteSource, Scan, fa},
    subscription::{BinaryFilter, SubscriberList},
};

/// Dispatcher for `0xFA` binary packets.
///
/// Also receives the FA packets reassembled by the
/// [`FbPacketDispatcher`](super::FbPacketDispatcher), which frames them from
/// its own scratch buffer.
#[derive(Debug)]
pub struct FaPacketDispatcher {
    subscribers: Arc<SubscriberList<BinaryFilter>>,
    measurements: Option<Arc<MeasurementQueue>>,
    max_length: usize,
    latest: Option<FaMetadata>,
}

impl FaPacketDispatcher {
    /// Create a dispatcher delivering to `subscribers` and rejecting packets
    /// longer than `max_length` in the live stream.
    #[must_use]
    pub fn new(subscribers: Arc<SubscriberList<BinaryFilter>>, max_length: usize) -> Self {
        Self {
            subscribers,
            measurements: None,
            max_length,
            latest: None,
        }
    }

    /// Also feed every packet to `queue`.
    #[must_use]
    pub fn with_measurements(mut self, queue: Arc<MeasurementQueue>) -> Self {
        self.measurements = Some(queue);
        self
    }

    /// [`find_packet`](PacketDispatcher::find_packet) over any byte source
    /// with an explicit length limit.
    pub fn find_packet_in<S: ByteSource + ?Sized>(
        &mut self,
        src: &S,
        sync_index: usize,
        max_length: usize,
    ) -> FindPacket {
        match fa::find_packet(src, sync_index, max_length) {
            Scan::Found(frame) => {
                let length = frame.length;
                self.latest = Some(FaMetadata {
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

    /// Copy of the packet found by the last successful search.
    ///
    /// The metadata stays available for [`FaPacketDispatcher::dispatch_packet`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAccessPrimaryBuffer`] when the bytes are no
    /// longer held by `src`.
    pub fn latest_packet<S: ByteSource + ?Sized>(
        &self,
        src: &S,
        sync_index: usize,
    ) -> Result<Option<Packet>> {
        let Some(meta) = &self.latest else {
            return Ok(None);
        };
        let bytes = src
            .bytes_at(sync_index, meta.length)
            .ok_or(Error::InvalidAccessPrimaryBuffer)?;
        Ok(Some(Packet {
            details: PacketDetails::Fa(meta.clone()),
            bytes: Bytes::from(bytes),
        }))
    }

    /// Deliver the packet found by the last successful search.
    ///
    /// # Errors
    ///
    /// Returns the last subscriber or measurement queue failure.
    pub fn dispatch_packet<S: ByteSource + ?Sized>(&mut self, src: &S, sync_index: usize) -> Result<()> {
        let Some(packet) = self.latest_packet(src, sync_index)? else {
            return Ok(());
        };
        self.latest = None;
        let PacketDetails::Fa(meta) = &packet.details else {
            return Ok(());
        };
        let measurements = *meta.header.measurements();
        let mut outcome = self
            .subscribers
            .publish(&packet, |filter| filter.matches(&measurements));
        if let Some(queue) = &self.measurements
            && let Err(error) = queue.push_binary(&packet, &measurements)
        {
            outcome = Err(error);
        }
        outcome
    }
}

impl PacketDispatcher for FaPacketDispatcher {
    fn sync_byte(&self) -> SyncByte { SyncByte::Fa }

    fn find_packet(&mut self, buffer: &ByteBuffer, sync_index: usize) -> FindPacket {
        self.find_packet_in(buffer, sync_index, self.max_length)
    }

    fn reset(&mut self) { self.latest = None; }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::FaPacketDispatcher;
    use crate::{
        ByteBuffer,
        Validity,
        dispatch::PacketDispatcher,
        measurement::{CompositeData, MeasurementQueue, MeasurementQueueMode},
        protocol::{
            binary_header::{BinaryHeader, EnabledMeasurements, Group},
            fa,
        },
        subscription::{BinaryFilter, BinaryFilterKind, PacketQueue, SubscriberList},
    };

    fn ypr_and_time() -> EnabledMeasurements {
        EnabledMeasurements::new()
            .with(Group::Common, 0)
            .with(Group::Common, 3)
    }

    #[rstest]
    #[case(BinaryFilterKind::ExactMatch, ypr_and_time(), true)]
    #[case(BinaryFilterKind::ExactMatch, EnabledMeasurements::new().with(Group::Common, 3), false)]
    #[case(BinaryFilterKind::AnyMatch, EnabledMeasurements::new().with(Group::Common, 3), true)]
    #[case(BinaryFilterKind::AnyMatch, EnabledMeasurements::new().with(Group::Imu, 4), false)]
    #[case(BinaryFilterKind::NotExactMatch, EnabledMeasurements::new().with(Group::Imu, 4), true)]
    fn filters_select_subscribers(
        #[case] kind: BinaryFilterKind,
        #[case] filter: EnabledMeasurements,
        #[case] delivered: bool,
    ) {
        let subscribers = Arc::new(SubscriberList::new(2));
        let (queue, mut rx) = PacketQueue::bounded(2);
        subscribers.add(queue, BinaryFilter::new(filter, kind)).unwrap();
        let measurements = Arc::new(MeasurementQueue::new(2, MeasurementQueueMode::Force));
        let mut dispatcher = FaPacketDispatcher::new(subscribers, 600)
            .with_measurements(Arc::clone(&measurements));

        let packet = fa::encode(&BinaryHeader::new(ypr_and_time()), &[7; 20]);
        let mut buffer = ByteBuffer::new(128);
        buffer.put(&packet).unwrap();
        assert_eq!(dispatcher.find_packet(&buffer, 0).validity, Validity::Valid);
        dispatcher.dispatch_packet(&buffer, 0).unwrap();

        assert_eq!(rx.try_recv().is_ok(), delivered);
        let Some(CompositeData::Binary(measurement)) = measurements.next() else {
            panic!("measurement not queued");
        };
        assert_eq!(measurement.field(Group::Common, 3), Some(&[7; 12][..]));
        assert_eq!(measurement.field(Group::Common, 0), Some(&[7; 8][..]));
    }
}
