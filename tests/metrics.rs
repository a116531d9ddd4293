#![cfg(feature = "metrics")]
//! Counters recorded while routing, checked with
//! `metrics_util::debugging::DebuggingRecorder`.

use metrics_util::debugging::{DebuggingRecorder, Snapshotter};
use rstest::{fixture, rstest};
use vnframe::{ASYNC_ERRORS_TOTAL, PACKETS_TOTAL, SKIPPED_BYTES_TOTAL, Sensor};
use vnframe_testing::{Counters, ascii_sentence, counter_value, imu_packet};

#[fixture]
fn recorder() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

#[rstest]
fn routed_packets_are_counted(recorder: (Snapshotter, DebuggingRecorder)) {
    let (snapshotter, recorder) = recorder;
    let mut broken = imu_packet([4.0, 5.0, 6.0]);
    let last = broken.len() - 1;
    broken[last] ^= 0xFF;
    let mut stream = b"xyz".to_vec();
    stream.extend(ascii_sentence("VNYPR,+010.000,-001.000,+000.500"));
    stream.extend(broken);
    stream.extend(imu_packet([1.0, 2.0, 3.0]));

    metrics::with_local_recorder(&recorder, || {
        let sensor = Sensor::builder().build().expect("default configuration");
        sensor.feed(&stream).unwrap();
        sensor.process_available_bytes();
    });

    let counters = Counters::capture(&snapshotter);
    let packets = |sync_byte, validity| {
        counters.value(
            PACKETS_TOTAL,
            &[("sync_byte", sync_byte), ("validity", validity)],
        )
    };
    assert_eq!(packets("ascii", "valid"), 1);
    assert_eq!(packets("fa", "valid"), 1);
    assert_eq!(packets("fa", "invalid"), 1);
    // Garbage prefix plus the whole corrupted FA packet.
    assert_eq!(counters.value(SKIPPED_BYTES_TOTAL, &[]), 3 + 18);
    assert_eq!(counters.value(ASYNC_ERRORS_TOTAL, &[]), 0);
}

#[rstest]
fn overflowing_subscriber_counts_async_error(recorder: (Snapshotter, DebuggingRecorder)) {
    let (snapshotter, recorder) = recorder;
    metrics::with_local_recorder(&recorder, || {
        let sensor = Sensor::builder().build().expect("default configuration");
        let (queue, _rx) = vnframe::PacketQueue::bounded(1);
        sensor
            .subscribe_sync_byte(queue, vnframe::SyncByte::Fa)
            .unwrap();
        let mut stream = imu_packet([1.0, 2.0, 3.0]);
        stream.extend(imu_packet([1.0, 2.0, 3.0]));
        sensor.feed(&stream).unwrap();
        sensor.process_available_bytes();
    });

    assert_eq!(counter_value(&snapshotter, ASYNC_ERRORS_TOTAL, &[]), 1);
}
