//! A mixed ASCII, FA and FB stream delivered through a connected sensor.

use std::time::Duration;

use rstest::rstest;
use vnframe::{
    AsciiFilter,
    BinaryFilter,
    BinaryFilterKind,
    EnabledMeasurements,
    FbFilter,
    Group,
    Packet,
    PacketQueue,
    PacketReceiver,
    Sensor,
};
use vnframe_testing::{ascii_sentence, fa_packet, fb_fragments, imu_packet, scripted_device};

async fn recv(rx: &mut PacketReceiver) -> Packet {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("packet within a second")
        .expect("queue open")
}

#[rstest]
#[tokio::test]
async fn heartbeat_fa_and_fragmented_packet_are_routed() {
    let sensor = Sensor::builder().build().expect("default configuration");
    let (ascii_queue, mut ascii) = PacketQueue::bounded(8);
    let (imu_queue, mut imu) = PacketQueue::bounded(8);
    let (completed_queue, mut completed) = PacketQueue::bounded(8);
    sensor
        .subscribe_ascii(ascii_queue, AsciiFilter::starts_with("$VNYPR"))
        .unwrap();
    sensor
        .subscribe_binary(
            imu_queue,
            BinaryFilter::new(
                EnabledMeasurements::new().with(Group::Imu, 1),
                BinaryFilterKind::AnyMatch,
            ),
        )
        .unwrap();
    sensor
        .subscribe_fb(
            completed_queue,
            FbFilter {
                packet: false,
                completed_fa_message: true,
            },
        )
        .unwrap();

    let (transport, device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    let heartbeat = ascii_sentence("VNYPR,+010.000,-001.000,+000.500");
    let imu_bytes = imu_packet([0.5, 0.25, -1.0]);
    let attitude: Vec<u8> = (1..=28).collect();
    let large = fa_packet(
        EnabledMeasurements::new()
            .with(Group::Attitude, 1)
            .with(Group::Attitude, 2),
        &attitude,
    );
    let mut stream = heartbeat.clone();
    stream.extend(&imu_bytes);
    for fragment in fb_fragments(&large, 2, 11) {
        stream.extend(fragment);
    }
    // Split mid-packet to exercise the listener's incremental loading.
    let (front, back) = stream.split_at(heartbeat.len() + 5);
    device.send(front);
    device.send(back);

    assert_eq!(recv(&mut ascii).await.bytes.as_ref(), heartbeat.as_slice());
    assert_eq!(recv(&mut imu).await.bytes.as_ref(), imu_bytes.as_slice());
    assert_eq!(recv(&mut completed).await.bytes.as_ref(), large.as_slice());

    sensor.disconnect().await;
    assert!(ascii.try_recv().is_err());
    assert!(imu.try_recv().is_err());
    assert!(completed.try_recv().is_err());
    assert_eq!(sensor.async_error_count(), 0);
    let stats = sensor.stats();
    assert_eq!(stats.ascii.valid, 1);
    assert_eq!(stats.fa.valid, 1);
    assert_eq!(stats.fb.valid, 2);
    assert_eq!(stats.skipped_bytes, 0);
}

#[rstest]
#[tokio::test]
async fn measurements_arrive_while_connected() {
    let sensor = Sensor::builder().build().expect("default configuration");
    let (transport, device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    device.send(imu_packet([1.0, 2.0, 3.0]));
    let measurement = sensor
        .next_measurement_timeout(Duration::from_secs(1))
        .await
        .expect("measurement");

    assert!(measurement.matches_measurements(&EnabledMeasurements::new().with(Group::Imu, 1)));
    sensor.disconnect().await;
}
