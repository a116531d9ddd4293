#![doc(html_root_url = "https://docs.rs/vnframe/latest")]
//! Public API for the `vnframe` library.
//!
//! This crate is the host-side core of a driver for inertial navigation
//! sensors speaking three interleaved grammars on one byte stream: ASCII
//! sentences, single-frame `0xFA` binary packets and `0xFB` fragments of
//! larger binary packets. It frames and validates packets, fans them out to
//! filtered subscriber queues, reassembles fragments, correlates command
//! responses and reports asynchronous device errors.

pub mod async_error;
pub mod byte_buffer;
pub mod byte_order;
pub mod checksum;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod measurement;
pub mod metrics;
pub mod packet;
pub mod protocol;
pub mod router;
pub mod sensor;
pub mod subscription;

pub use async_error::{AsyncError, AsyncErrorQueue};
pub use byte_buffer::ByteBuffer;
pub use command::{BlockMode, CommandProcessor, CommandState, GenericCommand, SendTimeouts};
pub use config::{ConfigError, SensorConfig};
pub use error::{Error, Result};
pub use measurement::{CompositeData, MeasurementDecoder, MeasurementQueue, MeasurementQueueMode};
pub use metrics::{ASYNC_ERRORS_TOTAL, COMMAND_TIMEOUTS_TOTAL, PACKETS_TOTAL, SKIPPED_BYTES_TOTAL};
pub use packet::{
    AsciiMetadata,
    FaMetadata,
    FbMetadata,
    FindPacket,
    Packet,
    PacketDetails,
    RawMetadata,
    SyncByte,
    Validity,
};
pub use protocol::{
    ascii::ChecksumMode,
    binary_header::{BinaryHeader, EnabledMeasurements, Group},
    fb::FbHeader,
};
pub use router::{PacketRouter, RouterStats};
pub use sensor::{Sensor, SensorBuilder};
pub use subscription::{
    AsciiFilter,
    AsciiFilterKind,
    BinaryFilter,
    BinaryFilterKind,
    FbFilter,
    PacketQueue,
    PacketReceiver,
};
