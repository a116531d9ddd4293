//! Sensor configuration.
//!
//! [`SensorConfig`] gathers every capacity and timeout of the driver core. It
//! deserialises with serde, so applications can load it from their own
//! configuration files; absent fields take the defaults below.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::{
    command::SendTimeouts,
    measurement::MeasurementQueueMode,
    protocol::ascii::ChecksumMode,
};

/// Errors returned when validating a [`SensorConfig`].
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A capacity that must be positive was zero.
    #[error("invalid capacity for {field}; must be >= 1")]
    InvalidCapacity {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A timeout was zero or the retry timeout was shorter than the send
    /// timeout.
    #[error("invalid timeouts; send={send:?}, retry={retry:?}")]
    InvalidTimeout {
        /// Configured send timeout.
        send: Duration,
        /// Configured retry timeout.
        retry: Duration,
    },
    /// No transmission would be allowed.
    #[error("invalid retry count {0}; must be >= 1")]
    InvalidRetryCount(u32),
    /// The live buffer cannot hold a packet of the maximum length.
    #[error("live buffer of {capacity} bytes cannot hold packets of {max_length} bytes")]
    BufferTooSmall {
        /// Configured live buffer capacity.
        capacity: usize,
        /// Configured maximum packet length.
        max_length: usize,
    },
}

/// Byte buffer sizes.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BufferConfig {
    /// Capacity of the live buffer fed by the transport.
    pub live_capacity: usize,
    /// Capacity of the FB reassembly buffer; bounds reassembled messages.
    pub fb_scratch_capacity: usize,
    /// Longest packet accepted from the live stream.
    pub packet_max_length: usize,
    /// Bytes requested from the transport per read.
    pub read_chunk: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            live_capacity: 4096,
            fb_scratch_capacity: 4096,
            packet_max_length: 600,
            read_chunk: 1024,
        }
    }
}

/// Command processor settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandConfig {
    /// Commands that may await a response at once.
    pub queue_capacity: usize,
    /// Wait for a response to one transmission, in milliseconds.
    pub send_timeout_ms: u64,
    /// Overall wait across retransmissions, in milliseconds.
    pub retry_timeout_ms: u64,
    /// Transmissions allowed in `BlockWithRetry` mode, the first included.
    pub retry_count: u32,
    /// Wait for the response to `WNV`, which rewrites flash, in milliseconds.
    pub write_settings_timeout_ms: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 5,
            send_timeout_ms: 500,
            retry_timeout_ms: 1500,
            retry_count: 3,
            write_settings_timeout_ms: 2500,
        }
    }
}

impl CommandConfig {
    /// Default timeouts for a send.
    #[must_use]
    pub const fn timeouts(&self) -> SendTimeouts {
        SendTimeouts {
            send: Duration::from_millis(self.send_timeout_ms),
            retry: Duration::from_millis(self.retry_timeout_ms),
            attempts: self.retry_count,
        }
    }
}

/// Measurement queue settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MeasurementQueueConfig {
    /// Enqueue policy.
    pub mode: MeasurementQueueMode,
    /// Measurements held at once.
    pub capacity: usize,
    /// Longest a `Retry` enqueue waits for space, in milliseconds.
    pub retry_budget_ms: u64,
}

impl Default for MeasurementQueueConfig {
    fn default() -> Self {
        Self {
            mode: MeasurementQueueMode::Force,
            capacity: 100,
            retry_budget_ms: 10,
        }
    }
}

/// ASCII grammar settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AsciiConfig {
    /// Longest sentence accepted.
    pub max_length: usize,
    /// Accepted checksum forms.
    pub checksum_mode: ChecksumMode,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            max_length: 256,
            checksum_mode: ChecksumMode::Either,
        }
    }
}

/// Complete driver configuration.
///
/// # Examples
///
/// ```
/// use vnframe::SensorConfig;
///
/// let config = SensorConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.command.queue_capacity, 5);
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SensorConfig {
    /// Byte buffer sizes.
    pub buffer: BufferConfig,
    /// Command processor settings.
    pub command: CommandConfig,
    /// Measurement queue settings.
    pub measurement_queue: MeasurementQueueConfig,
    /// ASCII grammar settings.
    pub ascii: AsciiConfig,
    /// Subscribers each dispatcher accepts.
    pub subscriber_capacity: SubscriberCapacity,
    /// Async errors held before the oldest is dropped.
    pub async_error_capacity: AsyncErrorCapacity,
}

/// Subscribers each dispatcher accepts.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, derive_more::From)]
#[serde(transparent)]
pub struct SubscriberCapacity(pub usize);

impl Default for SubscriberCapacity {
    fn default() -> Self { Self(8) }
}

/// Async errors held before the oldest is dropped.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, derive_more::From)]
#[serde(transparent)]
pub struct AsyncErrorCapacity(pub usize);

impl Default for AsyncErrorCapacity {
    fn default() -> Self { Self(20) }
}

impl SensorConfig {
    /// Check the configuration for values the driver cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacities = [
            ("buffer.live_capacity", self.buffer.live_capacity),
            ("buffer.fb_scratch_capacity", self.buffer.fb_scratch_capacity),
            ("buffer.packet_max_length", self.buffer.packet_max_length),
            ("buffer.read_chunk", self.buffer.read_chunk),
            ("command.queue_capacity", self.command.queue_capacity),
            ("ascii.max_length", self.ascii.max_length),
            ("subscriber_capacity", self.subscriber_capacity.0),
            ("async_error_capacity", self.async_error_capacity.0),
        ];
        if let Some((field, _)) = capacities.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidCapacity { field: *field });
        }
        if self.measurement_queue.mode != MeasurementQueueMode::Off
            && self.measurement_queue.capacity == 0
        {
            return Err(ConfigError::InvalidCapacity {
                field: "measurement_queue.capacity",
            });
        }
        let timeouts = self.command.timeouts();
        if timeouts.send.is_zero() || timeouts.retry < timeouts.send {
            return Err(ConfigError::InvalidTimeout {
                send: timeouts.send,
                retry: timeouts.retry,
            });
        }
        if self.command.retry_count == 0 {
            return Err(ConfigError::InvalidRetryCount(0));
        }
        if self.buffer.live_capacity < self.buffer.packet_max_length {
            return Err(ConfigError::BufferTooSmall {
                capacity: self.buffer.live_capacity,
                max_length: self.buffer.packet_max_length,
            });
        }
        Ok(())
    }
}
