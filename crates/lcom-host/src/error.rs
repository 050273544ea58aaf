//! Host error types.

use std::path::PathBuf;

use lcom_protocol::{ProtocolError, ValidationError};
use thiserror::Error;

/// Errors that can occur while running a host command.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("no serial port given; use --port or set `port` in the config file")]
    NoPort,

    #[error("receiver thread panicked")]
    ReceiverPanicked,
}

impl HostError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            HostError::Validation(_) => 2,
            _ => 1,
        }
    }
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lcom_protocol::Field;

    #[test]
    fn test_exit_codes() {
        let rejected = HostError::from(ValidationError::UnknownMode("Sleep".to_string()));
        assert_eq!(rejected.exit_code(), 2);
        assert_eq!(HostError::NoPort.exit_code(), 1);
    }

    #[test]
    fn test_rejection_names_field() {
        let err = HostError::from(ValidationError::OutOfRange {
            field: Field::Power,
            value: 30.0,
            min: -17.0,
            max: 22.0,
        });
        assert_eq!(err.to_string(), "rejected: power out of range: 30 not in [-17, 22]");
    }
}
