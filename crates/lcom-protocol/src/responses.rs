//! Acknowledgment and LoRa message payloads, and payload dispatch by
//! packet class.

use bytes::{Buf, BufMut};

use crate::commands::Command;
use crate::constants::*;
use crate::error::{ProtocolError, StatusCode};
use crate::types::*;

/// Acknowledgment payload: a status code followed by optional return data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Outcome of the acknowledged command.
    pub result: StatusCode,
    /// Return data of Get commands; empty otherwise.
    pub data: Vec<u8>,
}

impl Ack {
    /// An acknowledgment without return data.
    pub fn new(result: StatusCode) -> Self {
        Ack {
            result,
            data: Vec::new(),
        }
    }

    /// An acknowledgment carrying return data.
    pub fn with_data(result: StatusCode, data: Vec<u8>) -> Self {
        Ack { result, data }
    }

    /// Encode the payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ACK_HEADER_LEN + self.data.len());
        buf.put_u16(self.result.into());
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Decode the payload.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < ACK_HEADER_LEN {
            return Err(ProtocolError::FrameTooShort {
                expected: ACK_HEADER_LEN,
                actual: payload.len(),
            });
        }

        let mut buf = payload;
        let result = StatusCode::from(buf.get_u16());
        Ok(Ack {
            result,
            data: buf.to_vec(),
        })
    }

    /// Return data read as a GetLoraParameters reply.
    pub fn lora_parameters(&self) -> Result<LoraParameters, ProtocolError> {
        LoraParameters::decode(&self.data)
    }

    /// Return data read as a GetUnix reply.
    pub fn unix_time(&self) -> Result<u32, ProtocolError> {
        decode_unix_time(&self.data)
    }

    /// Return data read as a GetModeMessage reply.
    pub fn mode_message(&self) -> Result<ModeMessage, ProtocolError> {
        ModeMessage::decode(&self.data)
    }

    /// Return data read as a GetModuleStatus reply.
    pub fn module_status(&self) -> Result<ModuleStatus, ProtocolError> {
        ModuleStatus::decode(&self.data)
    }
}

/// LoRa message payload.
///
/// The host sends messages with zeroed link metrics; the module fills them
/// in for messages it received over the air.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioMessage {
    /// Received signal strength in dBm.
    pub rssi: i32,
    /// Signal-to-noise ratio in dB.
    pub snr: i32,
    /// Status code.
    pub result: StatusCode,
    /// Message bytes.
    pub message: Vec<u8>,
}

impl RadioMessage {
    /// An outgoing message with zero metrics and an OK result.
    pub fn outgoing(message: Vec<u8>) -> Self {
        RadioMessage {
            rssi: 0,
            snr: 0,
            result: StatusCode::Ok,
            message,
        }
    }

    /// Encode the payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MESSAGE_HEADER_LEN + self.message.len());
        buf.put_i32(self.rssi);
        buf.put_i32(self.snr);
        buf.put_u16(self.result.into());
        buf.extend_from_slice(&self.message);
        buf
    }

    /// Decode the payload.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < MESSAGE_HEADER_LEN {
            return Err(ProtocolError::FrameTooShort {
                expected: MESSAGE_HEADER_LEN,
                actual: payload.len(),
            });
        }

        let mut buf = payload;
        Ok(RadioMessage {
            rssi: buf.get_i32(),
            snr: buf.get_i32(),
            result: StatusCode::from(buf.get_u16()),
            message: buf.to_vec(),
        })
    }

    /// Message as text, replacing invalid UTF-8.
    pub fn message_text(&self) -> String {
        String::from_utf8_lossy(&self.message).to_string()
    }
}

/// A decoded payload, shaped by the packet class of its envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Command envelope.
    Command(Command),
    /// Acknowledgment envelope.
    Ack(Ack),
    /// LoRa message envelope.
    Message(RadioMessage),
}

impl Payload {
    /// Decode `payload` according to `class`.
    pub fn decode(class: PacketClass, payload: &[u8]) -> Result<Self, ProtocolError> {
        match class {
            PacketClass::Command => Ok(Payload::Command(Command::decode(payload)?)),
            PacketClass::Ack => Ok(Payload::Ack(Ack::decode(payload)?)),
            PacketClass::Message => Ok(Payload::Message(RadioMessage::decode(payload)?)),
        }
    }

    /// Packet class this payload travels under.
    pub fn class(&self) -> PacketClass {
        match self {
            Payload::Command(_) => PacketClass::Command,
            Payload::Ack(_) => PacketClass::Ack,
            Payload::Message(_) => PacketClass::Message,
        }
    }

    /// Encode the payload.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Payload::Command(command) => command.encode(),
            Payload::Ack(ack) => ack.encode(),
            Payload::Message(message) => message.encode(),
        }
    }
}
