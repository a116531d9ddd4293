//! Test helpers for driving a [`Sensor`](vnframe::Sensor) without hardware.
//!
//! * [`packets`] builds well-formed ASCII sentences, FA packets and FB
//!   fragment sequences.
//! * [`device`] runs a scripted device on one end of a
//!   `tokio::io::duplex` stream, answering the commands the sensor writes.
//! * [`logging`] and [`metrics`] capture what the driver reports.
//!
//! ```rust
//! use vnframe::{EnabledMeasurements, Group};
//! use vnframe_testing::{fa_packet, fb_fragments};
//!
//! let packet = fa_packet(EnabledMeasurements::new().with(Group::Imu, 1), &[0; 12]);
//! let fragments = fb_fragments(&packet, 2, 9);
//! assert_eq!(fragments.len(), 2);
//! ```

pub mod device;
pub mod logging;
pub mod metrics;
pub mod packets;

pub use device::{ScriptedDevice, scripted_device};
pub use logging::{LoggerHandle, logger};
pub use metrics::{Counters, counter_value};
pub use packets::{
    ascii_sentence,
    ascii_sentence_crc,
    fa_packet,
    fb_fragments,
    imu_packet,
    response_to,
};
