//! Measurement queue behaviour seen through the polled sensor API.

use rstest::rstest;
use vnframe::{
    CompositeData,
    EnabledMeasurements,
    Error,
    Group,
    MeasurementQueueMode,
    Sensor,
};
use vnframe_testing::{ascii_sentence, imu_packet};

fn feed(sensor: &Sensor, packets: &[Vec<u8>]) {
    for packet in packets {
        sensor.feed(packet).unwrap();
    }
    sensor.process_available_bytes();
}

#[rstest]
fn ascii_measurement_is_split_into_fields() {
    let sensor = Sensor::builder().build().unwrap();
    feed(&sensor, &[ascii_sentence("VNYPR,+010.000,-001.000,+000.500")]);

    let Some(CompositeData::Ascii(measurement)) = sensor.next_measurement() else {
        panic!("expected an ASCII measurement");
    };
    assert_eq!(measurement.header, "VNYPR");
    assert_eq!(measurement.fields, ["+010.000", "-001.000", "+000.500"]);
}

#[rstest]
fn non_measurement_sentences_are_not_queued() {
    let sensor = Sensor::builder().build().unwrap();
    feed(
        &sensor,
        &[
            ascii_sentence("PASHR,1,2,3"),
            ascii_sentence("VNRRG,05,115200"),
        ],
    );
    assert_eq!(sensor.measurement_count(), 0);
}

#[rstest]
#[case(MeasurementQueueMode::Off, 0, 0)]
#[case(MeasurementQueueMode::Force, 2, 0)]
#[case(MeasurementQueueMode::Try, 2, 1)]
#[case(MeasurementQueueMode::Retry, 2, 1)]
fn full_queue_follows_mode(
    #[case] mode: MeasurementQueueMode,
    #[case] queued: usize,
    #[case] errors: usize,
) {
    let sensor = Sensor::builder()
        .measurement_mode(mode)
        .measurement_capacity(2)
        .build()
        .unwrap();
    feed(
        &sensor,
        &[
            imu_packet([1.0, 0.0, 0.0]),
            imu_packet([2.0, 0.0, 0.0]),
            imu_packet([3.0, 0.0, 0.0]),
        ],
    );

    assert_eq!(sensor.measurement_count(), queued);
    assert_eq!(sensor.async_error_count(), errors);
    if errors > 0 {
        assert_eq!(sensor.throw_if_async_error(), Err(Error::MeasurementQueueFull));
    }
}

#[rstest]
fn force_keeps_newest_and_most_recent_pops_it() {
    let sensor = Sensor::builder().measurement_capacity(2).build().unwrap();
    let packets = [
        imu_packet([1.0, 0.0, 0.0]),
        imu_packet([2.0, 0.0, 0.0]),
        imu_packet([3.0, 0.0, 0.0]),
    ];
    feed(&sensor, &packets);

    let first_value = |data: CompositeData| match data {
        CompositeData::Binary(meas) => meas.field(Group::Imu, 1).map(|f| f[..4].to_vec()),
        CompositeData::Ascii(_) => None,
    };
    assert_eq!(
        sensor.most_recent_measurement().and_then(first_value),
        Some(3.0f32.to_le_bytes().to_vec())
    );
    assert_eq!(
        sensor.next_measurement().and_then(first_value),
        Some(2.0f32.to_le_bytes().to_vec())
    );
    assert!(sensor.next_measurement().is_none());
}

#[rstest]
fn disabled_measurements_are_ignored() {
    let sensor = Sensor::builder()
        .enabled_measurements(EnabledMeasurements::new().with(Group::Attitude, 1))
        .build()
        .unwrap();
    feed(&sensor, &[imu_packet([1.0, 2.0, 3.0])]);
    assert_eq!(sensor.measurement_count(), 0);
    assert_eq!(sensor.async_error_count(), 0);
}
