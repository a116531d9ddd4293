//! Metric helpers for `vnframe`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::{SyncByte, Validity};

/// Name of the counter tracking framed packets by grammar and validity.
pub const PACKETS_TOTAL: &str = "vnframe_packets_total";
/// Name of the counter tracking bytes skipped while resynchronising.
pub const SKIPPED_BYTES_TOTAL: &str = "vnframe_skipped_bytes_total";
/// Name of the counter tracking errors pushed to the async channel.
pub const ASYNC_ERRORS_TOTAL: &str = "vnframe_async_errors_total";
/// Name of the counter tracking commands that received no response in time.
pub const COMMAND_TIMEOUTS_TOTAL: &str = "vnframe_command_timeouts_total";

const fn validity_label(validity: Validity) -> &'static str {
    match validity {
        Validity::Valid => "valid",
        Validity::Invalid => "invalid",
        Validity::Incomplete => "incomplete",
    }
}

/// Record a packet found at a sync byte.
pub fn inc_packets(sync_byte: SyncByte, validity: Validity) {
    #[cfg(feature = "metrics")]
    counter!(
        PACKETS_TOTAL,
        "sync_byte" => sync_byte.as_str(),
        "validity" => validity_label(validity)
    )
    .increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = (sync_byte, validity_label(validity));
}

/// Record `count` skipped bytes.
pub fn add_skipped_bytes(count: usize) {
    #[cfg(feature = "metrics")]
    counter!(SKIPPED_BYTES_TOTAL).increment(u64::try_from(count).unwrap_or(u64::MAX));
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record an async error.
pub fn inc_async_errors() {
    #[cfg(feature = "metrics")]
    counter!(ASYNC_ERRORS_TOTAL).increment(1);
}

/// Record a command timeout.
pub fn inc_command_timeouts() {
    #[cfg(feature = "metrics")]
    counter!(COMMAND_TIMEOUTS_TOTAL).increment(1);
}
