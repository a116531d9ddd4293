//! Device commands and response correlation.
//!
//! A [`GenericCommand`] is registered with the [`CommandProcessor`], framed as
//! `$VN<command>*<crc>\r\n` and written to the transport. The ASCII
//! dispatcher hands every non-measurement `VN` sentence back to the processor,
//! which settles the matching command. [`BlockMode`] decides how long the
//! sender waits.

pub mod catalogue;
mod generic;
mod processor;

use std::time::Duration;

pub use generic::{CommandState, GenericCommand};
pub use processor::CommandProcessor;

/// How [`Sensor::send_command`](crate::Sensor::send_command) waits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockMode {
    /// Return once the command is written.
    None,
    /// Wait for a response up to the send timeout.
    Block,
    /// Like [`BlockMode::Block`], resending on timeout.
    #[default]
    BlockWithRetry,
}

/// Timeouts applied to one send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendTimeouts {
    /// Wait for a response to a single transmission.
    pub send: Duration,
    /// Overall bound across retransmissions.
    pub retry: Duration,
    /// Transmissions allowed, the first included.
    pub attempts: u32,
}
