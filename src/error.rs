//! Canonical error and result types for the crate.
//!
//! Every failure the driver core reports is an [`Error`] variant carrying the
//! numeric code the device family uses on the wire (for `VNERR` sentences) or
//! in its host-side tooling. Framing outcomes such as "incomplete" or
//! "invalid" are not errors; see [`crate::packet::Validity`].

use thiserror::Error;

/// Errors reported by the device, the command processor, the packet router
/// or the transport.
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The device hit an unrecoverable fault and must be reset.
    #[error("device hard fault")]
    HardFault,
    /// The device serial receive buffer overflowed.
    #[error("device serial buffer overflow")]
    SerialBufferOverflow,
    /// The device rejected the checksum of a received command.
    #[error("invalid checksum on command")]
    InvalidChecksum,
    /// The device did not recognise the command.
    #[error("invalid command")]
    InvalidCommand,
    /// The command carried too few parameters.
    #[error("not enough parameters")]
    NotEnoughParameters,
    /// The command carried too many parameters.
    #[error("too many parameters")]
    TooManyParameters,
    /// A parameter was out of range.
    #[error("invalid parameter")]
    InvalidParameter,
    /// The addressed register does not exist.
    #[error("invalid register")]
    InvalidRegister,
    /// The register may not be written.
    #[error("unauthorized access")]
    UnauthorizedAccess,
    /// The device watchdog fired.
    #[error("watchdog reset")]
    WatchdogReset,
    /// The device output buffer overflowed.
    #[error("output buffer overflow")]
    OutputBufferOverflow,
    /// The configured output cannot be sustained at the current baud rate.
    #[error("insufficient baud rate")]
    InsufficientBaudRate,
    /// The device error buffer overflowed and errors were lost.
    #[error("error buffer overflow")]
    ErrorBufferOverflow,

    /// A command was sent again after a timeout.
    #[error("command resent")]
    CommandResent,
    /// The pending command queue is at capacity.
    #[error("command queue full")]
    CommandQueueFull,
    /// No response arrived before the send timeout elapsed.
    #[error("response timeout")]
    ResponseTimeout,
    /// A packet arrived that does not fit the current state.
    #[error("received unexpected message")]
    ReceivedUnexpectedMessage,

    /// The measurement queue had no room for a new measurement.
    #[error("measurement queue full")]
    MeasurementQueueFull,
    /// The live byte buffer could not accept incoming bytes.
    #[error("primary buffer full")]
    PrimaryBufferFull,
    /// No more subscribers can be registered.
    #[error("message subscriber capacity reached")]
    MessageSubscriberCapacityReached,
    /// A response could not be interpreted.
    #[error("received invalid response")]
    ReceivedInvalidResponse,
    /// An index outside the live buffer was accessed.
    #[error("invalid access to primary buffer")]
    InvalidAccessPrimaryBuffer,
    /// A scratch buffer is full.
    #[error("buffer full")]
    BufferFull,
    /// The sensor already has a transport attached.
    #[error("already connected")]
    AlreadyConnected,

    /// The named port does not exist.
    #[error("invalid port name")]
    InvalidPortName,
    /// The port could not be opened.
    #[error("access denied")]
    AccessDenied,
    /// The transport is closed or was never opened.
    #[error("serial port closed")]
    SerialPortClosed,
    /// The requested baud rate is not supported.
    #[error("unsupported baud rate")]
    UnsupportedBaudRate,
    /// Reading from the transport failed.
    #[error("serial read failed")]
    SerialReadFailed,
    /// Writing to the transport failed.
    #[error("serial write failed")]
    SerialWriteFailed,
    /// The transport failed in an unclassified way.
    #[error("unexpected serial error")]
    UnexpectedSerialError,

    /// A byte buffer could not accept the bytes offered.
    #[error("received byte buffer full")]
    ReceivedByteBufferFull,
    /// A framed packet could not be parsed.
    #[error("parsing failed")]
    ParsingFailed,
    /// A subscriber queue had no free slot.
    #[error("packet queue full")]
    PacketQueueFull,
    /// A packet exceeded the slot size of a subscriber queue.
    #[error("packet queue overrun")]
    PacketQueueOverrun,
    /// A subscriber queue was dropped by its owner.
    #[error("packet queue closed")]
    PacketQueueNull,

    /// The file does not exist.
    #[error("file does not exist")]
    FileDoesNotExist,
    /// The file could not be opened.
    #[error("file open failed")]
    FileOpenFailed,
    /// Reading from the file failed.
    #[error("file read failed")]
    FileReadFailed,
    /// Writing to the file failed.
    #[error("file write failed")]
    FileWriteFailed,
}

const CODES: &[(Error, u16)] = &[
    (Error::HardFault, 0x01),
    (Error::SerialBufferOverflow, 0x02),
    (Error::InvalidChecksum, 0x03),
    (Error::InvalidCommand, 0x04),
    (Error::NotEnoughParameters, 0x05),
    (Error::TooManyParameters, 0x06),
    (Error::InvalidParameter, 0x07),
    (Error::InvalidRegister, 0x08),
    (Error::UnauthorizedAccess, 0x09),
    (Error::WatchdogReset, 0x0A),
    (Error::OutputBufferOverflow, 0x0B),
    (Error::InsufficientBaudRate, 0x0C),
    (Error::ErrorBufferOverflow, 0xFF),
    (Error::CommandResent, 301),
    (Error::CommandQueueFull, 302),
    (Error::ResponseTimeout, 303),
    (Error::ReceivedUnexpectedMessage, 304),
    (Error::MeasurementQueueFull, 600),
    (Error::PrimaryBufferFull, 601),
    (Error::MessageSubscriberCapacityReached, 603),
    (Error::ReceivedInvalidResponse, 604),
    (Error::InvalidAccessPrimaryBuffer, 606),
    (Error::BufferFull, 607),
    (Error::AlreadyConnected, 608),
    (Error::InvalidPortName, 700),
    (Error::AccessDenied, 701),
    (Error::SerialPortClosed, 702),
    (Error::UnsupportedBaudRate, 703),
    (Error::SerialReadFailed, 705),
    (Error::SerialWriteFailed, 706),
    (Error::UnexpectedSerialError, 799),
    (Error::ReceivedByteBufferFull, 801),
    (Error::ParsingFailed, 802),
    (Error::PacketQueueFull, 803),
    (Error::PacketQueueOverrun, 804),
    (Error::PacketQueueNull, 805),
    (Error::FileDoesNotExist, 901),
    (Error::FileOpenFailed, 902),
    (Error::FileReadFailed, 903),
    (Error::FileWriteFailed, 904),
];

impl Error {
    /// Numeric code of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use vnframe::Error;
    ///
    /// assert_eq!(Error::ResponseTimeout.code(), 303);
    /// assert_eq!(Error::InvalidRegister.code(), 8);
    /// ```
    #[must_use]
    pub fn code(self) -> u16 {
        CODES
            .iter()
            .find_map(|&(error, code)| (error == self).then_some(code))
            .unwrap_or_default()
    }

    /// Look up the error carrying `code`.
    ///
    /// Returns `None` for `0` and for codes the crate does not know.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        CODES
            .iter()
            .find_map(|&(error, known)| (known == code).then_some(error))
    }

    /// Whether the error was reported by the device in a `VNERR` sentence.
    #[must_use]
    pub fn is_device_error(self) -> bool { self.code() <= 0xFF }

    /// Whether a `VNERR` carrying this error answers the pending command.
    ///
    /// The remaining device errors (hard fault, watchdog reset, output and
    /// error buffer overflow) are raised spontaneously and belong on the
    /// asynchronous error channel.
    #[must_use]
    pub const fn is_command_response(self) -> bool {
        matches!(
            self,
            Self::SerialBufferOverflow
                | Self::InvalidChecksum
                | Self::InvalidCommand
                | Self::NotEnoughParameters
                | Self::TooManyParameters
                | Self::InvalidParameter
                | Self::InvalidRegister
                | Self::UnauthorizedAccess
                | Self::InsufficientBaudRate
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::NotFound => Self::InvalidPortName,
            ErrorKind::PermissionDenied => Self::AccessDenied,
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof => Self::SerialPortClosed,
            _ => Self::UnexpectedSerialError,
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
