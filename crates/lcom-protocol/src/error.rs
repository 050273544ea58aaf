//! Protocol error types.

use std::fmt;

use thiserror::Error;

/// A user-supplied command field, as named in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Carrier frequency (MHz).
    Frequency,
    /// Bandwidth (kHz).
    Bandwidth,
    /// Spreading factor.
    SpreadingFactor,
    /// Coding rate.
    CodingRate,
    /// Sync word.
    SyncWord,
    /// Output power (dBm).
    Power,
    /// Preamble length (symbols).
    PreambleLength,
    /// Current limit (mA).
    CurrentLimit,
    /// UNIX timestamp (seconds).
    UnixTimestamp,
    /// Operating mode.
    Mode,
    /// Message text.
    Message,
}

impl Field {
    /// Name of the field as shown to an operator.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Frequency => "frequency",
            Field::Bandwidth => "bandwidth",
            Field::SpreadingFactor => "spreading factor",
            Field::CodingRate => "coding rate",
            Field::SyncWord => "sync word",
            Field::Power => "power",
            Field::PreambleLength => "preamble length",
            Field::CurrentLimit => "current limit",
            Field::UnixTimestamp => "UNIX timestamp",
            Field::Mode => "mode",
            Field::Message => "message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rejection of a command before anything is encoded or framed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The field was empty or not a number of the expected kind.
    #[error("{field} is not a valid number: {raw:?}")]
    NotNumeric {
        /// Offending field.
        field: Field,
        /// Text as supplied.
        raw: String,
    },

    /// The value lies outside the field's domain.
    #[error("{field} out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        /// Offending field.
        field: Field,
        /// Value as supplied.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },

    /// The value is inside the range but reserved.
    #[error("{field} value 0x{value:02X} is reserved")]
    Reserved {
        /// Offending field.
        field: Field,
        /// Reserved value.
        value: u8,
    },

    /// Mode name is not one of the known modes.
    #[error("unknown mode: {0:?}")]
    UnknownMode(String),

    /// Message length outside the accepted bounds.
    #[error("{field} length {len} not in [{min}, {max}]")]
    BadLength {
        /// Offending field.
        field: Field,
        /// Length as supplied, in bytes.
        len: usize,
        /// Shortest accepted length.
        min: usize,
        /// Longest accepted length.
        max: usize,
    },
}

impl ValidationError {
    /// The field that caused the rejection.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::NotNumeric { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::Reserved { field, .. }
            | ValidationError::BadLength { field, .. } => *field,
            ValidationError::UnknownMode(_) => Field::Mode,
        }
    }
}

/// Errors that can occur when decoding inbound bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Frame is too long.
    #[error("frame too long: maximum {max} bytes, got {actual}")]
    FrameTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length received.
        actual: usize,
    },

    /// First byte is not the start flag.
    #[error("missing start flag: found 0x{0:02X}")]
    MissingStartFlag(u8),

    /// Byte at the position given by the length field is not the end flag.
    #[error("missing end flag: found 0x{0:02X}")]
    MissingEndFlag(u8),

    /// Length field disagrees with the number of bytes supplied.
    #[error("length field says {declared} bytes, frame has {actual}")]
    LengthMismatch {
        /// Value of the length field.
        declared: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// Packet class bits do not name a known class.
    #[error("unknown packet class: 0b{0:03b}")]
    UnknownPacketClass(u8),

    /// Unknown command id.
    #[error("unknown command id: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Unknown mode value.
    #[error("unknown mode value: 0x{0:02X}")]
    UnknownMode(u8),

    /// Payload has the wrong size for its command.
    #[error("malformed payload for command 0x{command:02X}: expected {expected} bytes, got {actual}")]
    MalformedPayload {
        /// Command id.
        command: u8,
        /// Expected payload length.
        expected: usize,
        /// Actual payload length.
        actual: usize,
    },
}

/// Status codes carried in the result field of Ack and Message payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Command executed.
    Ok,
    /// Payload size did not match the command.
    MalformedPayload,
    /// Command id not recognised.
    UnknownCommand,
    /// Frequency rejected by the module.
    InvalidFrequency,
    /// Bandwidth rejected by the module.
    InvalidBandwidth,
    /// Spreading factor rejected by the module.
    InvalidSpreadingFactor,
    /// Coding rate rejected by the module.
    InvalidCodingRate,
    /// Sync word rejected by the module.
    InvalidSyncWord,
    /// Power rejected by the module.
    InvalidPower,
    /// Preamble length rejected by the module.
    InvalidPreambleLength,
    /// Current limit rejected by the module.
    InvalidCurrentLimit,
    /// Envelope failed verification.
    MalformedPacket,
    /// Envelope did not start with the start flag.
    MisplacedStartFlag,
    /// Envelope did not end with the end flag.
    MisplacedEndFlag,
    /// Any other code, including radio driver codes.
    Unknown(u16),
}

impl StatusCode {
    /// Whether this code reports success.
    pub fn is_ok(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Ok => write!(f, "ok"),
            StatusCode::MalformedPayload => write!(f, "malformed payload"),
            StatusCode::UnknownCommand => write!(f, "unknown command"),
            StatusCode::InvalidFrequency => write!(f, "invalid frequency"),
            StatusCode::InvalidBandwidth => write!(f, "invalid bandwidth"),
            StatusCode::InvalidSpreadingFactor => write!(f, "invalid spreading factor"),
            StatusCode::InvalidCodingRate => write!(f, "invalid coding rate"),
            StatusCode::InvalidSyncWord => write!(f, "invalid sync word"),
            StatusCode::InvalidPower => write!(f, "invalid power"),
            StatusCode::InvalidPreambleLength => write!(f, "invalid preamble length"),
            StatusCode::InvalidCurrentLimit => write!(f, "invalid current limit"),
            StatusCode::MalformedPacket => write!(f, "malformed packet"),
            StatusCode::MisplacedStartFlag => write!(f, "misplaced start flag"),
            StatusCode::MisplacedEndFlag => write!(f, "misplaced end flag"),
            StatusCode::Unknown(code) => write!(f, "unknown status (0x{:04X})", code),
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        use crate::constants::*;
        match code {
            CMD_OK => StatusCode::Ok,
            CMD_MALFORMED_PAYLOAD => StatusCode::MalformedPayload,
            CMD_UNKNOWN_COMMAND => StatusCode::UnknownCommand,
            CMD_INVALID_FREQUENCY => StatusCode::InvalidFrequency,
            CMD_INVALID_BANDWIDTH => StatusCode::InvalidBandwidth,
            CMD_INVALID_SPREADING_FACTOR => StatusCode::InvalidSpreadingFactor,
            CMD_INVALID_CODING_RATE => StatusCode::InvalidCodingRate,
            CMD_INVALID_SYNC_WORD => StatusCode::InvalidSyncWord,
            CMD_INVALID_POWER => StatusCode::InvalidPower,
            CMD_INVALID_PREAMBLE_LENGTH => StatusCode::InvalidPreambleLength,
            CMD_INVALID_CURRENT_LIMIT => StatusCode::InvalidCurrentLimit,
            MALFORMED_PACKET => StatusCode::MalformedPacket,
            MISPLACED_START_FLAG => StatusCode::MisplacedStartFlag,
            MISPLACED_END_FLAG => StatusCode::MisplacedEndFlag,
            _ => StatusCode::Unknown(code),
        }
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> Self {
        use crate::constants::*;
        match code {
            StatusCode::Ok => CMD_OK,
            StatusCode::MalformedPayload => CMD_MALFORMED_PAYLOAD,
            StatusCode::UnknownCommand => CMD_UNKNOWN_COMMAND,
            StatusCode::InvalidFrequency => CMD_INVALID_FREQUENCY,
            StatusCode::InvalidBandwidth => CMD_INVALID_BANDWIDTH,
            StatusCode::InvalidSpreadingFactor => CMD_INVALID_SPREADING_FACTOR,
            StatusCode::InvalidCodingRate => CMD_INVALID_CODING_RATE,
            StatusCode::InvalidSyncWord => CMD_INVALID_SYNC_WORD,
            StatusCode::InvalidPower => CMD_INVALID_POWER,
            StatusCode::InvalidPreambleLength => CMD_INVALID_PREAMBLE_LENGTH,
            StatusCode::InvalidCurrentLimit => CMD_INVALID_CURRENT_LIMIT,
            StatusCode::MalformedPacket => MALFORMED_PACKET,
            StatusCode::MisplacedStartFlag => MISPLACED_START_FLAG,
            StatusCode::MisplacedEndFlag => MISPLACED_END_FLAG,
            StatusCode::Unknown(code) => code,
        }
    }
}
