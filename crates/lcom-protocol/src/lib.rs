//! L-COM Serial Protocol
//!
//! This crate provides types and utilities for talking to an L-COM LoRa
//! module over its serial link. Every packet travels in the same envelope:
//! start flag, a type/sequence byte, total length, UNIX timestamp, payload
//! and end flag.
//!
//! # Protocol Overview
//!
//! Envelopes come in three packet classes:
//!
//! - **Commands** (host → module): payload starts with a command id
//! - **Acks** (module → host): status code, then any return data
//! - **Messages** (either way): link metrics, status code, message bytes
//!
//! Each envelope takes the next id of a 5-bit counter, so ids cycle 0-31.
//! Operator input is validated before anything is framed; a rejected
//! command consumes no id.
//!
//! # Example
//!
//! ```rust,ignore
//! use lcom_protocol::{ProtocolSession, RawLoraParameters};
//!
//! let mut session = ProtocolSession::new();
//!
//! // Build a command
//! let envelope = session.set_lora_parameters(&RawLoraParameters::default())?;
//! port.write_all(&envelope.to_bytes())?;
//!
//! // Parse a reply
//! session.feed(&received_data);
//! if let Some(inbound) = session.try_decode()? {
//!     println!("{:?}", inbound.payload);
//! }
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod responses;
mod sequence;
mod session;
mod types;
mod validate;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use responses::*;
pub use sequence::*;
pub use session::*;
pub use types::*;
pub use validate::*;
