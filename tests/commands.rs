//! Command transmission, response correlation and blocking behaviour over an
//! in-memory transport.

use std::{sync::Arc, time::Duration};

use rstest::{fixture, rstest};
use vnframe::{
    BlockMode,
    CommandState,
    Error,
    GenericCommand,
    Sensor,
    command::catalogue,
};
use vnframe_testing::{
    LoggerHandle,
    ascii_sentence,
    ascii_sentence_crc,
    logger,
    response_to,
    scripted_device,
};

#[fixture]
fn sensor() -> Sensor {
    Sensor::builder()
        .send_timeout(Duration::from_millis(100))
        .retry_timeout(Duration::from_millis(1000))
        .retry_count(3)
        .build()
        .expect("valid configuration")
}

#[rstest]
#[tokio::test]
async fn block_returns_response(sensor: Sensor) {
    let (transport, device) = scripted_device(|_, line| vec![response_to(line, &["1"])]);
    sensor.connect(transport).await.unwrap();

    let command = Arc::new(catalogue::known_magnetic_disturbance(true));
    sensor.send_command(&command, BlockMode::Block).await.unwrap();

    assert!(command.has_valid_response());
    assert_eq!(command.response_values(), Some(vec!["1".to_owned()]));
    assert!(command.responded_at() >= command.sent_at());
    assert_eq!(device.received_count(), 1);
    sensor.disconnect().await;
}

#[rstest]
#[tokio::test]
async fn block_times_out_and_ignores_late_response(sensor: Sensor) {
    let (transport, device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    let command = Arc::new(catalogue::read_register(5));
    let outcome = sensor.send_command(&command, BlockMode::Block).await;

    assert_eq!(outcome, Err(Error::ResponseTimeout));
    assert_eq!(command.state(), CommandState::TimedOut);
    assert_eq!(device.received_count(), 1);

    device.send(ascii_sentence_crc("VNRRG,05,115200"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(command.state(), CommandState::TimedOut);
    assert_eq!(sensor.async_error_count(), 0);
    sensor.disconnect().await;
}

#[rstest]
#[tokio::test]
async fn retry_succeeds_on_second_transmission(sensor: Sensor) {
    let (transport, device) = scripted_device(|index, line| {
        if index == 0 {
            Vec::new()
        } else {
            vec![response_to(line, &["115200"])]
        }
    });
    sensor.connect(transport).await.unwrap();

    let values = sensor.read_register(5).await.unwrap();

    assert_eq!(values, ["115200"]);
    assert_eq!(device.received_count(), 2);
    let received = device.received();
    assert_eq!(received[0], received[1]);
    sensor.disconnect().await;
}

#[rstest]
#[tokio::test]
async fn retry_gives_up_after_configured_attempts(sensor: Sensor) {
    let (transport, device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    let command = Arc::new(catalogue::write_settings());
    let outcome = sensor
        .send_command_with_timeouts(
            &command,
            BlockMode::BlockWithRetry,
            Duration::from_millis(50),
            Duration::from_secs(5),
        )
        .await;

    assert_eq!(outcome, Err(Error::ResponseTimeout));
    assert_eq!(device.received_count(), 3);
    sensor.disconnect().await;
}

#[rstest]
#[tokio::test]
async fn retry_timeout_bounds_attempts(sensor: Sensor) {
    let (transport, device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    let command = Arc::new(catalogue::set_filter_bias());
    let outcome = sensor
        .send_command_with_timeouts(
            &command,
            BlockMode::BlockWithRetry,
            Duration::from_millis(100),
            Duration::from_millis(150),
        )
        .await;

    assert_eq!(outcome, Err(Error::ResponseTimeout));
    assert_eq!(device.received_count(), 2);
    sensor.disconnect().await;
}

#[rstest]
#[tokio::test]
async fn synchronous_device_error_fails_command(sensor: Sensor) {
    let (transport, _device) = scripted_device(|_, _| vec![ascii_sentence("VNERR,07")]);
    sensor.connect(transport).await.unwrap();

    let command = Arc::new(catalogue::write_register(6, "9"));
    let outcome = sensor.send_command(&command, BlockMode::Block).await;

    assert_eq!(outcome, Err(Error::InvalidParameter));
    assert_eq!(command.error(), Some(Error::InvalidParameter));
    assert_eq!(sensor.async_error_count(), 0);
    sensor.disconnect().await;
}

#[rstest]
#[tokio::test]
async fn asynchronous_device_error_reaches_channel(sensor: Sensor) {
    let (transport, device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    device.send(ascii_sentence("VNERR,01"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let error = sensor.next_async_error().expect("async error");
    assert_eq!(error.error, Error::HardFault);
    assert!(error.message.starts_with("$VNERR,01"));
    sensor.disconnect().await;
}

#[rstest]
#[tokio::test]
async fn response_to_later_command_marks_earlier_stale(sensor: Sensor) {
    let (transport, device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    let first = Arc::new(catalogue::read_register(1));
    let second = Arc::new(catalogue::read_register(2));
    sensor.send_command(&first, BlockMode::None).await.unwrap();
    sensor.send_command(&second, BlockMode::None).await.unwrap();

    device.send(ascii_sentence_crc("VNRRG,02,VN-100"));
    let state = second.wait_for_response(Duration::from_millis(500)).await;

    assert!(matches!(state, CommandState::Completed(_)));
    assert_eq!(first.state(), CommandState::Stale);
    sensor.disconnect().await;
}

#[rstest]
#[tokio::test]
async fn full_command_queue_is_reported(sensor: Sensor) {
    let (transport, _device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    let capacity = sensor.config().command.queue_capacity;
    for id in 0..capacity {
        let command = Arc::new(catalogue::read_register(u8::try_from(id).unwrap()));
        sensor.send_command(&command, BlockMode::None).await.unwrap();
    }
    let overflow = Arc::new(GenericCommand::new("RRG,99", 6));

    assert_eq!(
        sensor.send_command(&overflow, BlockMode::None).await,
        Err(Error::CommandQueueFull)
    );
    assert_eq!(overflow.state(), CommandState::Idle);
    sensor.disconnect().await;
}

#[rstest]
#[tokio::test]
async fn closed_transport_fails_pending_commands(sensor: Sensor) {
    let (transport, device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    let command = Arc::new(catalogue::reset());
    sensor.send_command(&command, BlockMode::None).await.unwrap();
    device.close().await;

    let state = command.wait_for_response(Duration::from_millis(500)).await;
    assert_eq!(state, CommandState::Failed(Error::SerialPortClosed));
    assert_eq!(
        sensor.next_async_error().map(|entry| entry.error),
        Some(Error::SerialPortClosed)
    );
    assert!(!sensor.is_connected());
}

#[rstest]
#[tokio::test]
async fn timeout_is_logged(sensor: Sensor, mut logger: LoggerHandle) {
    let (transport, _device) = scripted_device(|_, _| Vec::new());
    sensor.connect(transport).await.unwrap();

    let command = Arc::new(catalogue::async_output_enable(false));
    let _ = sensor.send_command(&command, BlockMode::Block).await;

    let warnings = logger.drain_at(log::Level::Warn);
    assert!(
        warnings.iter().any(|message| message.contains("command timed out")),
        "missing timeout warning: {warnings:?}"
    );
    sensor.disconnect().await;
}
