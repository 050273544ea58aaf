//! Host side of the L-COM serial link.
//!
//! Turns operator commands into validated envelopes, writes them to the
//! module over a serial port, and logs whatever the module sends back.

pub mod cli;
pub mod config;
pub mod error;
pub mod receiver;
pub mod transport;

pub use config::{HostConfig, LoraConfig};
pub use error::{HostError, HostResult};
pub use receiver::{receive, spawn_receiver, ReceiveEvent, ReceiveStats};
pub use transport::{HexTransport, SerialTransport, Transport, WriterTransport};
