//! Builder for [`Sensor`].

use std::{sync::Arc, time::Duration};

use super::Sensor;
use crate::{
    config::{ConfigError, SensorConfig},
    measurement::{MeasurementDecoder, MeasurementQueue, MeasurementQueueMode, RawFieldDecoder},
    protocol::binary_header::EnabledMeasurements,
};

/// Builder for [`Sensor`].
///
/// Starts from [`SensorConfig::default`]; individual settings can be
/// overridden before [`SensorBuilder::build`] validates the result.
///
/// # Examples
///
/// ```
/// use vnframe::{MeasurementQueueMode, Sensor};
///
/// let sensor = Sensor::builder()
///     .measurement_mode(MeasurementQueueMode::Try)
///     .measurement_capacity(16)
///     .build()
///     .expect("valid configuration");
/// assert!(!sensor.is_connected());
/// ```
pub struct SensorBuilder {
    config: SensorConfig,
    decoder: Box<dyn MeasurementDecoder>,
    enabled: EnabledMeasurements,
}

impl Default for SensorBuilder {
    fn default() -> Self {
        Self {
            config: SensorConfig::default(),
            decoder: Box::new(RawFieldDecoder),
            enabled: EnabledMeasurements::all(),
        }
    }
}

impl SensorBuilder {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: SensorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the measurement queue enqueue policy.
    #[must_use]
    pub fn measurement_mode(mut self, mode: MeasurementQueueMode) -> Self {
        self.config.measurement_queue.mode = mode;
        self
    }

    /// Set the number of measurements held at once.
    #[must_use]
    pub fn measurement_capacity(mut self, capacity: usize) -> Self {
        self.config.measurement_queue.capacity = capacity;
        self
    }

    /// Only queue binary measurements sharing a field with `enabled`.
    #[must_use]
    pub fn enabled_measurements(mut self, enabled: EnabledMeasurements) -> Self {
        self.enabled = enabled;
        self
    }

    /// Decode measurements with `decoder`.
    #[must_use]
    pub fn measurement_decoder(mut self, decoder: impl MeasurementDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Set the default per-transmission response timeout.
    #[must_use]
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.command.send_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the default overall timeout across retransmissions.
    #[must_use]
    pub fn retry_timeout(mut self, timeout: Duration) -> Self {
        self.config.command.retry_timeout_ms =
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the number of transmissions allowed with retry, the first included.
    #[must_use]
    pub fn retry_count(mut self, count: u32) -> Self {
        self.config.command.retry_count = count;
        self
    }

    /// Validate the configuration and build the sensor.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] reported by [`SensorConfig::validate`].
    pub fn build(self) -> Result<Sensor, ConfigError> {
        self.config.validate()?;
        let queue_config = &self.config.measurement_queue;
        let measurements = MeasurementQueue::new(queue_config.capacity, queue_config.mode)
            .with_enabled(self.enabled)
            .with_decoder(self.decoder)
            .with_retry_budget(Duration::from_millis(queue_config.retry_budget_ms));
        Ok(Sensor::from_parts(self.config, Arc::new(measurements)))
    }
}
