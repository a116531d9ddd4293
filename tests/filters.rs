//! Subscriber filters applied by each dispatcher.

use rstest::{fixture, rstest};
use vnframe::{
    AsciiFilter,
    AsciiFilterKind,
    BinaryFilter,
    BinaryFilterKind,
    EnabledMeasurements,
    Error,
    Group,
    PacketQueue,
    PacketReceiver,
    Sensor,
    SensorConfig,
};
use vnframe_testing::{ascii_sentence, fa_packet, imu_packet};

#[fixture]
fn sensor() -> Sensor { Sensor::builder().build().expect("default configuration") }

fn count(rx: &mut PacketReceiver) -> usize { std::iter::from_fn(|| rx.try_recv().ok()).count() }

fn ascii_stream() -> Vec<u8> {
    let mut stream = ascii_sentence("VNYPR,+010.000,-001.000,+000.500");
    stream.extend(ascii_sentence("VNQTN,+0.1,+0.2,+0.3,+0.9"));
    stream.extend(ascii_sentence("GPGGA,1,2"));
    stream
}

#[rstest]
#[case(AsciiFilter::starts_with("$VNYPR"), 1)]
#[case(AsciiFilter::starts_with("VN"), 2)]
#[case(AsciiFilter::does_not_start_with("VN"), 1)]
#[case(AsciiFilter::new("", AsciiFilterKind::DoesNotStartWith), 3)]
fn ascii_filters_select_headers(sensor: Sensor, #[case] filter: AsciiFilter, #[case] expected: usize) {
    let (queue, mut rx) = PacketQueue::bounded(8);
    sensor.subscribe_ascii(queue, filter).unwrap();

    sensor.feed(&ascii_stream()).unwrap();
    sensor.process_available_bytes();

    assert_eq!(count(&mut rx), expected);
}

fn imu() -> EnabledMeasurements { EnabledMeasurements::new().with(Group::Imu, 1) }

fn imu_and_attitude() -> EnabledMeasurements { imu().with(Group::Attitude, 1) }

#[rstest]
#[case(BinaryFilter::new(imu(), BinaryFilterKind::AnyMatch), 2)]
#[case(BinaryFilter::new(imu(), BinaryFilterKind::ExactMatch), 1)]
#[case(BinaryFilter::new(imu(), BinaryFilterKind::NotExactMatch), 1)]
#[case(BinaryFilter::new(EnabledMeasurements::new(), BinaryFilterKind::ExactMatch), 2)]
#[case(BinaryFilter::new(EnabledMeasurements::new().with(Group::Time, 0), BinaryFilterKind::AnyMatch), 0)]
fn binary_filters_select_measurements(
    sensor: Sensor,
    #[case] filter: BinaryFilter,
    #[case] expected: usize,
) {
    let (queue, mut rx) = PacketQueue::bounded(8);
    sensor.subscribe_binary(queue, filter).unwrap();

    let mut stream = imu_packet([1.0, 2.0, 3.0]);
    stream.extend(fa_packet(imu_and_attitude(), &[0; 24]));
    sensor.feed(&stream).unwrap();
    sensor.process_available_bytes();

    assert_eq!(count(&mut rx), expected);
}

#[rstest]
fn unsubscribing_one_filter_keeps_the_other(sensor: Sensor) {
    let (queue, mut rx) = PacketQueue::bounded(8);
    let ypr = AsciiFilter::starts_with("VNYPR");
    sensor.subscribe_ascii(queue.clone(), ypr.clone()).unwrap();
    sensor
        .subscribe_ascii(queue.clone(), AsciiFilter::starts_with("GP"))
        .unwrap();
    sensor.unsubscribe_ascii(&queue, &ypr);

    sensor.feed(&ascii_stream()).unwrap();
    sensor.process_available_bytes();

    assert_eq!(count(&mut rx), 1);
}

#[rstest]
fn subscriber_capacity_is_enforced() {
    let config = SensorConfig {
        subscriber_capacity: 1.into(),
        ..SensorConfig::default()
    };
    let sensor = Sensor::builder().config(config).build().unwrap();
    let (first, _first_rx) = PacketQueue::bounded(1);
    let (second, _second_rx) = PacketQueue::bounded(1);

    sensor.subscribe_binary(first, BinaryFilter::any()).unwrap();
    assert_eq!(
        sensor.subscribe_binary(second, BinaryFilter::any()),
        Err(Error::MessageSubscriberCapacityReached)
    );
}

#[rstest]
fn full_subscriber_queue_reports_async_error(sensor: Sensor) {
    let (queue, mut rx) = PacketQueue::bounded(1);
    sensor.subscribe_binary(queue, BinaryFilter::any()).unwrap();

    let mut stream = imu_packet([1.0, 2.0, 3.0]);
    stream.extend(imu_packet([4.0, 5.0, 6.0]));
    sensor.feed(&stream).unwrap();
    sensor.process_available_bytes();

    assert_eq!(count(&mut rx), 1);
    assert_eq!(sensor.throw_if_async_error(), Err(Error::PacketQueueFull));
}

#[rstest]
fn oversized_packet_overruns_slot(sensor: Sensor) {
    let (queue, mut rx) = PacketQueue::bounded(4);
    sensor
        .subscribe_binary(queue.with_slot_capacity(8), BinaryFilter::any())
        .unwrap();

    sensor.feed(&imu_packet([1.0, 2.0, 3.0])).unwrap();
    sensor.process_available_bytes();

    assert_eq!(count(&mut rx), 0);
    assert_eq!(sensor.throw_if_async_error(), Err(Error::PacketQueueOverrun));
}
