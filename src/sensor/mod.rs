//! The [`Sensor`] facade tying the driver core together.
//!
//! A sensor owns the live byte buffer, the packet router and its
//! dispatchers, the command processor, the async error channel and the
//! measurement queue. Bytes reach the router in one of two ways:
//!
//! * polled: the caller hands bytes to [`Sensor::feed`] and runs the router
//!   with [`Sensor::process_available_bytes`];
//! * threaded: [`Sensor::connect`] splits a transport and spawns a listener
//!   task that reads and routes continuously.
//!
//! Commands are written to the transport's write half, or to the writer
//! attached with [`Sensor::attach_writer`] in the polled model.

mod builder;
mod listener;

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

pub use builder::SensorBuilder;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, warn};

use crate::{
    ByteBuffer,
    Error,
    Result,
    SyncByte,
    async_error::{AsyncError, AsyncErrorQueue},
    command::{BlockMode, CommandProcessor, CommandState, GenericCommand, SendTimeouts, catalogue},
    config::SensorConfig,
    dispatch::{AsciiPacketDispatcher, FaPacketDispatcher, FbPacketDispatcher},
    measurement::{CompositeData, MeasurementQueue},
    metrics,
    router::{PacketRouter, RouterStats},
    subscription::{AsciiFilter, BinaryFilter, FbFilter, PacketQueue, SubscriberList},
};

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Router and the live buffer it consumes, locked together.
#[derive(Debug)]
pub(crate) struct LiveState {
    router: PacketRouter,
    buffer: ByteBuffer,
}

impl LiveState {
    /// Load `bytes` in pieces that fit and route after each piece.
    fn load_and_process(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            let room = self.buffer.remaining();
            if room == 0 {
                warn!(dropped = bytes.len(), "live buffer stuck full; resetting");
                self.buffer.reset();
                self.router.reset();
                return Err(Error::PrimaryBufferFull);
            }
            let (piece, rest) = bytes.split_at(room.min(bytes.len()));
            self.buffer.put(piece)?;
            self.router.note_received(piece.len());
            self.router.process_available(&mut self.buffer);
            bytes = rest;
        }
        Ok(())
    }
}

fn lock(live: &Mutex<LiveState>) -> MutexGuard<'_, LiveState> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct ListenerHandle {
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

/// Host-side driver for one device connection.
pub struct Sensor {
    config: SensorConfig,
    live: Arc<Mutex<LiveState>>,
    ascii_subscribers: Arc<SubscriberList<AsciiFilter>>,
    binary_subscribers: Arc<SubscriberList<BinaryFilter>>,
    fb_subscribers: Arc<SubscriberList<FbFilter>>,
    skipped_subscribers: Arc<SubscriberList<()>>,
    commands: Arc<CommandProcessor>,
    async_errors: Arc<AsyncErrorQueue>,
    measurements: Arc<MeasurementQueue>,
    writer: tokio::sync::Mutex<Option<Writer>>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl std::fmt::Debug for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sensor")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .field("pending_commands", &self.commands.len())
            .field("async_errors", &self.async_errors.len())
            .finish_non_exhaustive()
    }
}

impl Sensor {
    /// Start building a sensor from the default configuration.
    #[must_use]
    pub fn builder() -> SensorBuilder { SensorBuilder::default() }

    pub(crate) fn from_parts(config: SensorConfig, measurements: Arc<MeasurementQueue>) -> Self {
        let subscriber_capacity = config.subscriber_capacity.0;
        let async_errors = Arc::new(AsyncErrorQueue::new(config.async_error_capacity.0));
        let commands = Arc::new(CommandProcessor::new(
            config.command.queue_capacity,
            Arc::clone(&async_errors),
        ));
        let ascii_subscribers = Arc::new(SubscriberList::new(subscriber_capacity));
        let binary_subscribers = Arc::new(SubscriberList::new(subscriber_capacity));
        let fb_subscribers = Arc::new(SubscriberList::new(subscriber_capacity));
        let skipped_subscribers = Arc::new(SubscriberList::new(subscriber_capacity));

        let ascii = AsciiPacketDispatcher::new(
            Arc::clone(&ascii_subscribers),
            Arc::clone(&commands),
            config.ascii.max_length,
        )
        .with_checksum_mode(config.ascii.checksum_mode)
        .with_measurements(Arc::clone(&measurements));
        let fa = FaPacketDispatcher::new(
            Arc::clone(&binary_subscribers),
            config.buffer.packet_max_length,
        )
        .with_measurements(Arc::clone(&measurements));
        let fb = FbPacketDispatcher::new(
            Arc::clone(&fb_subscribers),
            config.buffer.fb_scratch_capacity,
            config.buffer.packet_max_length,
        );
        let router = PacketRouter::new(
            ascii,
            fa,
            fb,
            Arc::clone(&async_errors),
            Arc::clone(&skipped_subscribers),
            config.buffer.packet_max_length,
        );

        Self {
            live: Arc::new(Mutex::new(LiveState {
                router,
                buffer: ByteBuffer::new(config.buffer.live_capacity),
            })),
            config,
            ascii_subscribers,
            binary_subscribers,
            fb_subscribers,
            skipped_subscribers,
            commands,
            async_errors,
            measurements,
            writer: tokio::sync::Mutex::new(None),
            listener: Mutex::new(None),
        }
    }

    /// Configuration the sensor was built with.
    #[must_use]
    pub const fn config(&self) -> &SensorConfig { &self.config }

    fn live(&self) -> MutexGuard<'_, LiveState> { lock(&self.live) }

    fn listener(&self) -> MutexGuard<'_, Option<ListenerHandle>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---------------------------------------------------------------------
    // Connection
    // ---------------------------------------------------------------------

    /// Split `transport` and start the listener task on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyConnected`] when a listener is running.
    pub async fn connect<T>(&self, transport: T) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }
        let (reader, writer) = tokio::io::split(transport);
        *self.writer.lock().await = Some(Box::new(writer));

        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let task = listener::Listener {
            reader,
            live: Arc::clone(&self.live),
            async_errors: Arc::clone(&self.async_errors),
            commands: Arc::clone(&self.commands),
            shutdown: shutdown.clone(),
            read_chunk: self.config.buffer.read_chunk,
        };
        tracker.spawn(task.run());
        tracker.close();
        self.measurements.set_waiting_allowed(true);
        *self.listener() = Some(ListenerHandle { shutdown, tracker });
        info!("sensor connected");
        Ok(())
    }

    /// Use `writer` for command transmission without starting a listener.
    ///
    /// Responses must then be supplied through [`Sensor::feed`].
    pub async fn attach_writer(&self, writer: impl AsyncWrite + Send + Unpin + 'static) {
        *self.writer.lock().await = Some(Box::new(writer));
    }

    /// Whether a listener task is reading the transport.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.listener()
            .as_ref()
            .is_some_and(|handle| !handle.shutdown.is_cancelled())
    }

    /// Stop the listener, release the transport and clear per-connection
    /// state.
    ///
    /// Pending commands fail with [`Error::SerialPortClosed`]. Calling this
    /// while disconnected only clears state.
    pub async fn disconnect(&self) {
        let handle = self.listener().take();
        if let Some(handle) = handle {
            handle.shutdown.cancel();
            handle.tracker.wait().await;
        }
        if let Some(mut writer) = self.writer.lock().await.take()
            && let Err(err) = writer.shutdown().await
        {
            debug!(error = %err, "transport shutdown failed");
        }
        self.measurements.set_waiting_allowed(false);
        self.commands.fail_all(Error::SerialPortClosed);
        let mut live = self.live();
        live.buffer.reset();
        live.router.reset();
        info!("sensor disconnected");
    }

    // ---------------------------------------------------------------------
    // Polled model
    // ---------------------------------------------------------------------

    /// Append received bytes to the live buffer without routing them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PrimaryBufferFull`] when `bytes` does not fit; nothing
    /// is appended in that case.
    pub fn feed(&self, bytes: &[u8]) -> Result<()> {
        let mut live = self.live();
        live.buffer
            .put(bytes)
            .map_err(|_| Error::PrimaryBufferFull)?;
        live.router.note_received(bytes.len());
        Ok(())
    }

    /// Route at most one packet.
    ///
    /// Returns `true` when more bytes are needed before another packet can
    /// be found.
    pub fn process_next_packet(&self) -> bool {
        let mut live = self.live();
        let LiveState { router, buffer } = &mut *live;
        router.dispatch_next_packet(buffer)
    }

    /// Route every complete packet in the live buffer.
    pub fn process_available_bytes(&self) {
        let mut live = self.live();
        let LiveState { router, buffer } = &mut *live;
        router.process_available(buffer);
    }

    /// Packet and byte counters.
    #[must_use]
    pub fn stats(&self) -> RouterStats { self.live().router.stats() }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    /// Send `command` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// See [`Sensor::send_command_with_timeouts`].
    pub async fn send_command(&self, command: &Arc<GenericCommand>, mode: BlockMode) -> Result<()> {
        self.send_with(command, mode, self.config.command.timeouts())
            .await
    }

    /// Send `command`, waiting up to `send` for each response and `retry`
    /// across retransmissions.
    ///
    /// # Errors
    ///
    /// * [`Error::CommandQueueFull`] when the pending queue is at capacity.
    /// * [`Error::SerialPortClosed`] when no writer is attached, or
    ///   [`Error::SerialWriteFailed`] when the write fails.
    /// * [`Error::ResponseTimeout`] when a blocking send gets no response.
    /// * The device error carried by a `VNERR` answering the command.
    pub async fn send_command_with_timeouts(
        &self,
        command: &Arc<GenericCommand>,
        mode: BlockMode,
        send: Duration,
        retry: Duration,
    ) -> Result<()> {
        let timeouts = SendTimeouts {
            send,
            retry,
            ..self.config.command.timeouts()
        };
        self.send_with(command, mode, timeouts).await
    }

    async fn send_with(
        &self,
        command: &Arc<GenericCommand>,
        mode: BlockMode,
        timeouts: SendTimeouts,
    ) -> Result<()> {
        let attempts = match mode {
            BlockMode::BlockWithRetry => timeouts.attempts.max(1),
            BlockMode::None | BlockMode::Block => 1,
        };
        let deadline = tokio::time::Instant::now() + timeouts.retry.max(timeouts.send);

        for attempt in 1..=attempts {
            let frame = self.commands.register(command)?;
            if let Err(error) = self.write(frame.as_bytes()).await {
                self.commands.withdraw(command);
                command.settle(CommandState::Failed(error));
                return Err(error);
            }
            debug!(command = command.command(), attempt, "command sent");
            if mode == BlockMode::None {
                return Ok(());
            }

            let wait = match mode {
                BlockMode::BlockWithRetry => timeouts
                    .send
                    .min(deadline.saturating_duration_since(tokio::time::Instant::now())),
                _ => timeouts.send,
            };
            if let Some(outcome) = settled(command.wait_for_response(wait).await) {
                return outcome;
            }

            self.commands.withdraw(command);
            command.settle(CommandState::TimedOut);
            // A response may have landed between the wait and the withdrawal.
            if let Some(outcome) = settled(command.state()) {
                return outcome;
            }
            metrics::inc_command_timeouts();
            warn!(command = command.command(), attempt, "command timed out");
            if tokio::time::Instant::now() >= deadline {
                break;
            }
        }
        Err(Error::ResponseTimeout)
    }

    async fn write(&self, frame: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let Some(writer) = writer.as_mut() else {
            return Err(Error::SerialPortClosed);
        };
        let written = async {
            writer.write_all(frame).await?;
            writer.flush().await
        }
        .await;
        written.map_err(|err| {
            warn!(error = %err, "command write failed");
            Error::SerialWriteFailed
        })
    }

    async fn send_fixed(&self, command: GenericCommand) -> Result<Arc<GenericCommand>> {
        let command = Arc::new(command);
        self.send_command(&command, BlockMode::BlockWithRetry).await?;
        Ok(command)
    }

    /// Persist the current register values (`WNV`).
    ///
    /// # Errors
    ///
    /// See [`Sensor::send_command_with_timeouts`].
    pub async fn write_settings(&self) -> Result<()> {
        let defaults = self.config.command.timeouts();
        let send = Duration::from_millis(self.config.command.write_settings_timeout_ms);
        let command = Arc::new(catalogue::write_settings());
        self.send_command_with_timeouts(
            &command,
            BlockMode::BlockWithRetry,
            send,
            defaults.retry.max(send),
        )
        .await
    }

    /// Reset the device (`RST`).
    ///
    /// Errors the device reports while rebooting are discarded from the
    /// async error channel.
    ///
    /// # Errors
    ///
    /// See [`Sensor::send_command_with_timeouts`].
    pub async fn reset(&self) -> Result<()> {
        let mark = Instant::now();
        self.send_fixed(catalogue::reset()).await?;
        self.async_errors.discard_since(mark);
        Ok(())
    }

    /// Restore factory settings (`RFS`), discarding reboot errors like
    /// [`Sensor::reset`].
    ///
    /// # Errors
    ///
    /// See [`Sensor::send_command_with_timeouts`].
    pub async fn restore_factory_settings(&self) -> Result<()> {
        let mark = Instant::now();
        self.send_fixed(catalogue::restore_factory_settings()).await?;
        self.async_errors.discard_since(mark);
        Ok(())
    }

    /// Tell the filter whether a magnetic disturbance is present (`KMD`).
    ///
    /// # Errors
    ///
    /// See [`Sensor::send_command_with_timeouts`].
    pub async fn known_magnetic_disturbance(&self, present: bool) -> Result<()> {
        self.send_fixed(catalogue::known_magnetic_disturbance(present))
            .await
            .map(drop)
    }

    /// Pause or resume asynchronous output (`ASY`).
    ///
    /// # Errors
    ///
    /// See [`Sensor::send_command_with_timeouts`].
    pub async fn async_output_enable(&self, enable: bool) -> Result<()> {
        self.send_fixed(catalogue::async_output_enable(enable))
            .await
            .map(drop)
    }

    /// Read register `id`, returning the values after the echoed id.
    ///
    /// # Errors
    ///
    /// See [`Sensor::send_command_with_timeouts`].
    pub async fn read_register(&self, id: u8) -> Result<Vec<String>> {
        let command = self.send_fixed(catalogue::read_register(id)).await?;
        command
            .response_values()
            .ok_or(Error::ReceivedInvalidResponse)
    }

    /// Write comma-separated `values` to register `id`.
    ///
    /// # Errors
    ///
    /// See [`Sensor::send_command_with_timeouts`].
    pub async fn write_register(&self, id: u8, values: &str) -> Result<()> {
        self.send_fixed(catalogue::write_register(id, values))
            .await
            .map(drop)
    }

    // ---------------------------------------------------------------------
    // Subscriptions
    // ---------------------------------------------------------------------

    /// Deliver ASCII sentences whose header passes `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageSubscriberCapacityReached`] when the list is
    /// full.
    pub fn subscribe_ascii(&self, queue: PacketQueue, filter: AsciiFilter) -> Result<()> {
        self.ascii_subscribers.add(queue, filter)
    }

    /// Deliver FA packets whose measurements pass `filter`.
    ///
    /// # Errors
    ///
    /// See [`Sensor::subscribe_ascii`].
    pub fn subscribe_binary(&self, queue: PacketQueue, filter: BinaryFilter) -> Result<()> {
        self.binary_subscribers.add(queue, filter)
    }

    /// Deliver FB fragments and/or reassembled messages.
    ///
    /// # Errors
    ///
    /// See [`Sensor::subscribe_ascii`].
    pub fn subscribe_fb(&self, queue: PacketQueue, filter: FbFilter) -> Result<()> {
        self.fb_subscribers.add(queue, filter)
    }

    /// Deliver everything framed with `sync_byte`.
    ///
    /// [`SyncByte::None`] subscribes to the bytes the router skips.
    ///
    /// # Errors
    ///
    /// See [`Sensor::subscribe_ascii`].
    pub fn subscribe_sync_byte(&self, queue: PacketQueue, sync_byte: SyncByte) -> Result<()> {
        match sync_byte {
            SyncByte::Ascii => self.subscribe_ascii(queue, AsciiFilter::starts_with("")),
            SyncByte::Fa => self.subscribe_binary(queue, BinaryFilter::any()),
            SyncByte::Fb => self.subscribe_fb(
                queue,
                FbFilter {
                    packet: true,
                    completed_fa_message: false,
                },
            ),
            SyncByte::None => self.skipped_subscribers.add(queue, ()),
        }
    }

    /// Remove `queue`'s ASCII subscription with `filter`.
    pub fn unsubscribe_ascii(&self, queue: &PacketQueue, filter: &AsciiFilter) {
        self.ascii_subscribers.remove_where(queue, |f| f == filter);
    }

    /// Remove `queue`'s FA subscription with `filter`.
    pub fn unsubscribe_binary(&self, queue: &PacketQueue, filter: &BinaryFilter) {
        self.binary_subscribers.remove_where(queue, |f| f == filter);
    }

    /// Remove `queue`'s FB subscription with `filter`.
    pub fn unsubscribe_fb(&self, queue: &PacketQueue, filter: &FbFilter) {
        self.fb_subscribers.remove_where(queue, |f| f == filter);
    }

    /// Remove every subscription `queue` holds for `sync_byte`.
    pub fn unsubscribe_sync_byte(&self, queue: &PacketQueue, sync_byte: SyncByte) {
        match sync_byte {
            SyncByte::Ascii => self.ascii_subscribers.remove(queue),
            SyncByte::Fa => self.binary_subscribers.remove(queue),
            SyncByte::Fb => self.fb_subscribers.remove(queue),
            SyncByte::None => self.skipped_subscribers.remove(queue),
        }
    }

    /// Remove `queue` from every subscriber list.
    pub fn unsubscribe(&self, queue: &PacketQueue) {
        self.ascii_subscribers.remove(queue);
        self.binary_subscribers.remove(queue);
        self.fb_subscribers.remove(queue);
        self.skipped_subscribers.remove(queue);
    }

    // ---------------------------------------------------------------------
    // Measurements and async errors
    // ---------------------------------------------------------------------

    /// Oldest queued measurement.
    #[must_use]
    pub fn next_measurement(&self) -> Option<CompositeData> { self.measurements.next() }

    /// Newest queued measurement, removed from the queue.
    #[must_use]
    pub fn most_recent_measurement(&self) -> Option<CompositeData> {
        self.measurements.most_recent()
    }

    /// Wait up to `timeout` for a measurement.
    pub async fn next_measurement_timeout(&self, timeout: Duration) -> Option<CompositeData> {
        self.measurements.next_timeout(timeout).await
    }

    /// Number of queued measurements.
    #[must_use]
    pub fn measurement_count(&self) -> usize { self.measurements.len() }

    /// Oldest queued async error.
    #[must_use]
    pub fn next_async_error(&self) -> Option<AsyncError> { self.async_errors.next_async_error() }

    /// Fail with the oldest queued async error, if any.
    ///
    /// # Errors
    ///
    /// Returns the error of the oldest queued [`AsyncError`].
    pub fn throw_if_async_error(&self) -> Result<()> { self.async_errors.throw_if_async_error() }

    /// Number of queued async errors.
    #[must_use]
    pub fn async_error_count(&self) -> usize { self.async_errors.len() }
}

/// Outcome of a command that left the pending state, `None` when it is
/// still unanswered.
fn settled(state: CommandState) -> Option<Result<()>> {
    match state {
        CommandState::Completed(_) => Some(Ok(())),
        CommandState::Failed(error) => Some(Err(error)),
        CommandState::Idle
        | CommandState::Pending
        | CommandState::TimedOut
        | CommandState::Stale => None,
    }
}

impl Drop for Sensor {
    fn drop(&mut self) {
        if let Some(handle) = self.listener().take() {
            handle.shutdown.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use rstest::{fixture, rstest};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::Sensor;
    use crate::{
        Error,
        SyncByte,
        command::{BlockMode, GenericCommand, catalogue},
        protocol::ascii,
        subscription::PacketQueue,
    };

    #[fixture]
    fn sensor() -> Sensor {
        Sensor::builder()
            .send_timeout(Duration::from_millis(50))
            .retry_timeout(Duration::from_millis(200))
            .build()
            .expect("default configuration is valid")
    }

    #[rstest]
    fn feed_rejects_bytes_that_do_not_fit(sensor: Sensor) {
        let capacity = sensor.config().buffer.live_capacity;
        assert_eq!(
            sensor.feed(&vec![0; capacity + 1]),
            Err(Error::PrimaryBufferFull)
        );
        assert_eq!(sensor.stats().received_bytes, 0);
    }

    #[rstest]
    fn polled_sentence_reaches_subscriber(sensor: Sensor) {
        let (queue, mut rx) = PacketQueue::bounded(4);
        sensor.subscribe_sync_byte(queue, SyncByte::Ascii).unwrap();
        let sentence = ascii::frame_with_checksum8("VNYPR,+010.000,-001.000,+000.500");

        sensor.feed(sentence.as_bytes()).unwrap();
        assert!(!sensor.process_next_packet());
        assert!(sensor.process_next_packet());

        let packet = rx.try_recv().unwrap();
        assert_eq!(packet.ascii_header(), Some("VNYPR"));
        assert_eq!(sensor.stats().ascii.valid, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn send_without_writer_fails(sensor: Sensor) {
        let command = Arc::new(catalogue::write_settings());
        assert_eq!(
            sensor.send_command(&command, BlockMode::None).await,
            Err(Error::SerialPortClosed)
        );
        assert!(!command.is_awaiting_response());
    }

    #[rstest]
    #[tokio::test]
    async fn blocking_send_completes_on_echo(sensor: Sensor) {
        let (host, device) = tokio::io::duplex(1024);
        sensor.connect(host).await.unwrap();
        assert_eq!(sensor.connect(tokio::io::duplex(8).0).await, Err(Error::AlreadyConnected));

        let device = tokio::spawn(async move {
            let (reader, mut writer) = tokio::io::split(device);
            let mut lines = BufReader::new(reader).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            assert!(line.starts_with("$VNRRG,05*"));
            let reply = ascii::frame_with_crc("VNRRG,05,115200");
            writer.write_all(reply.as_bytes()).await.unwrap();
            lines
        });

        let values = sensor.read_register(5).await.unwrap();
        assert_eq!(values, ["115200"]);
        drop(device.await.unwrap());
        sensor.disconnect().await;
        assert!(!sensor.is_connected());
    }

    #[rstest]
    #[tokio::test]
    async fn disconnect_fails_pending_commands(sensor: Sensor) {
        let (host, _device) = tokio::io::duplex(1024);
        sensor.connect(host).await.unwrap();
        let command = Arc::new(GenericCommand::new("RRG,01", 6));
        sensor.send_command(&command, BlockMode::None).await.unwrap();
        assert!(command.is_awaiting_response());

        sensor.disconnect().await;
        assert_eq!(command.error(), Some(Error::SerialPortClosed));
    }
}
