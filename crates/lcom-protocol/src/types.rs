//! Common types used in the protocol.
//!
//! All multi-byte fields are big-endian and `f32` fields are IEEE-754
//! binary32, both on the way out and on the way in.

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut};

use crate::constants::*;
use crate::error::*;

/// Packet class carried in the top three bits of the type/sequence byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketClass {
    /// Acknowledgment, optionally with return data.
    Ack,
    /// Command for the module.
    Command,
    /// LoRa message to transmit or that was received.
    Message,
}

impl PacketClass {
    /// The 3-bit class tag.
    pub fn tag(&self) -> u8 {
        match self {
            PacketClass::Ack => ACK_PACKET,
            PacketClass::Command => COMMAND_PACKET,
            PacketClass::Message => MESSAGE_PACKET,
        }
    }
}

impl TryFrom<u8> for PacketClass {
    type Error = ProtocolError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            ACK_PACKET => Ok(PacketClass::Ack),
            COMMAND_PACKET => Ok(PacketClass::Command),
            MESSAGE_PACKET => Ok(PacketClass::Message),
            _ => Err(ProtocolError::UnknownPacketClass(tag)),
        }
    }
}

impl fmt::Display for PacketClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketClass::Ack => write!(f, "ack"),
            PacketClass::Command => write!(f, "command"),
            PacketClass::Message => write!(f, "message"),
        }
    }
}

/// A 5-bit cyclic sequence id (0-31).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SequenceId(u8);

impl SequenceId {
    /// Largest sequence id.
    pub const MAX: u8 = SEQUENCE_MODULUS - 1;

    /// Create a sequence id. Returns None above 31.
    pub fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(SequenceId(value))
        } else {
            None
        }
    }

    /// Take the low five bits of a byte.
    pub fn from_masked(byte: u8) -> Self {
        SequenceId(byte & SEQUENCE_MASK)
    }

    /// The numeric id.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// The id that follows this one, wrapping after 31.
    pub fn successor(&self) -> Self {
        SequenceId((self.0 + 1) % SEQUENCE_MODULUS)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operating mode of the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Normal operation.
    #[default]
    Normal,
    /// Periodically retransmit the repeater message.
    Repeater,
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Normal => NORMAL_MODE,
            Mode::Repeater => REPEATER_MODE,
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            NORMAL_MODE => Ok(Mode::Normal),
            REPEATER_MODE => Ok(Mode::Repeater),
            _ => Err(ProtocolError::UnknownMode(value)),
        }
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    /// Accepts the mode names `Normal` and `Repeater`, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Mode::Normal),
            "repeater" => Ok(Mode::Repeater),
            _ => Err(ValidationError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => write!(f, "Normal"),
            Mode::Repeater => write!(f, "Repeater"),
        }
    }
}

/// LoRa radio configuration.
///
/// Constructed from operator input through
/// [`validate_lora_parameters`](crate::validate_lora_parameters), or decoded
/// from GetLoraParameters return data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoraParameters {
    /// Carrier frequency in MHz.
    pub frequency: f32,
    /// Bandwidth in kHz.
    pub bandwidth: f32,
    /// Spreading factor (5-12).
    pub spreading_factor: u8,
    /// Coding rate denominator (5-8).
    pub coding_rate: u8,
    /// Sync word.
    pub sync_word: u8,
    /// Output power in dBm.
    pub power: i8,
    /// Preamble length in symbols.
    pub preamble_length: u16,
    /// Over-current protection limit in mA.
    pub current_limit: f32,
}

impl Default for LoraParameters {
    fn default() -> Self {
        LoraParameters {
            frequency: DEFAULT_FREQUENCY,
            bandwidth: DEFAULT_BANDWIDTH,
            spreading_factor: DEFAULT_SPREADING_FACTOR,
            coding_rate: DEFAULT_CODING_RATE,
            sync_word: DEFAULT_SYNC_WORD,
            power: DEFAULT_POWER,
            preamble_length: DEFAULT_PREAMBLE_LENGTH,
            current_limit: DEFAULT_CURRENT_LIMIT,
        }
    }
}

impl LoraParameters {
    /// Append the 18-byte parameter block.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.put_f32(self.frequency);
        buf.put_f32(self.bandwidth);
        buf.put_u8(self.spreading_factor);
        buf.put_u8(self.coding_rate);
        buf.put_u8(self.sync_word);
        buf.put_i8(self.power);
        buf.put_u16(self.preamble_length);
        buf.put_f32(self.current_limit);
    }

    /// Decode the 18-byte parameter block (GetLoraParameters return data).
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < GET_LORA_PARAMETERS_RETURN_LEN {
            return Err(ProtocolError::FrameTooShort {
                expected: GET_LORA_PARAMETERS_RETURN_LEN,
                actual: data.len(),
            });
        }

        let mut buf = data;
        Ok(LoraParameters {
            frequency: buf.get_f32(),
            bandwidth: buf.get_f32(),
            spreading_factor: buf.get_u8(),
            coding_rate: buf.get_u8(),
            sync_word: buf.get_u8(),
            power: buf.get_i8(),
            preamble_length: buf.get_u16(),
            current_limit: buf.get_f32(),
        })
    }
}

/// Mode and repeater message (GetModeMessage return data).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeMessage {
    /// Operating mode.
    pub mode: Mode,
    /// Repeater message bytes.
    pub message: Vec<u8>,
}

impl ModeMessage {
    /// Decode a mode byte followed by the message bytes.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let (&mode, message) = data.split_first().ok_or(ProtocolError::FrameTooShort {
            expected: 1,
            actual: 0,
        })?;

        Ok(ModeMessage {
            mode: Mode::try_from(mode)?,
            message: message.to_vec(),
        })
    }

    /// Message as text, replacing invalid UTF-8.
    pub fn message_text(&self) -> String {
        String::from_utf8_lossy(&self.message).to_string()
    }
}

/// Module status block (GetModuleStatus return data).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModuleStatus {
    /// LoRa parameters have been set since boot.
    pub lora_set: bool,
    /// UNIX time has been set since boot.
    pub unix_set: bool,
    /// Milliseconds since boot.
    pub uptime_ms: u32,
    /// Radio module temperature in degrees Celsius.
    pub temperature: f32,
    /// Time on air of the last transmission.
    pub time_on_air: u32,
    /// Current LoRa data rate.
    pub data_rate: f32,
}

impl ModuleStatus {
    /// Decode the 18-byte status block.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < GET_MODULE_STATUS_RETURN_LEN {
            return Err(ProtocolError::FrameTooShort {
                expected: GET_MODULE_STATUS_RETURN_LEN,
                actual: data.len(),
            });
        }

        let mut buf = data;
        Ok(ModuleStatus {
            lora_set: buf.get_u8() != 0,
            unix_set: buf.get_u8() != 0,
            uptime_ms: buf.get_u32(),
            temperature: buf.get_f32(),
            time_on_air: buf.get_u32(),
            data_rate: buf.get_f32(),
        })
    }
}

/// Decode GetUnix return data.
pub fn decode_unix_time(data: &[u8]) -> Result<u32, ProtocolError> {
    if data.len() < GET_UNIX_RETURN_LEN {
        return Err(ProtocolError::FrameTooShort {
            expected: GET_UNIX_RETURN_LEN,
            actual: data.len(),
        });
    }
    Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_class_tags() {
        assert_eq!(PacketClass::Ack.tag(), 0b000);
        assert_eq!(PacketClass::Command.tag(), 0b001);
        assert_eq!(PacketClass::Message.tag(), 0b010);
        assert_eq!(PacketClass::try_from(0b010), Ok(PacketClass::Message));
        assert_eq!(
            PacketClass::try_from(0b011),
            Err(ProtocolError::UnknownPacketClass(0b011))
        );
    }

    #[test]
    fn test_sequence_id_bounds() {
        assert!(SequenceId::new(31).is_some());
        assert!(SequenceId::new(32).is_none());
        assert_eq!(SequenceId::from_masked(0b0110_0101).value(), 5);
        assert_eq!(SequenceId::new(31).unwrap().successor().value(), 0);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Normal".parse::<Mode>(), Ok(Mode::Normal));
        assert_eq!("repeater".parse::<Mode>(), Ok(Mode::Repeater));
        assert_eq!(
            "Beacon".parse::<Mode>(),
            Err(ValidationError::UnknownMode("Beacon".to_string()))
        );
        assert_eq!(Mode::try_from(2), Err(ProtocolError::UnknownMode(2)));
    }

    #[test]
    fn test_default_lora_parameter_block() {
        let mut buf = Vec::new();
        LoraParameters::default().encode_into(&mut buf);

        assert_eq!(
            buf,
            vec![
                0x44, 0x64, 0xC0, 0x00, // 915.0
                0x42, 0xFA, 0x00, 0x00, // 125.0
                0x09, 0x07, 0x12, 0x0E, // SF, CR, sync word, power
                0x00, 0x08, // preamble
                0x42, 0x70, 0x00, 0x00, // 60.0
            ]
        );
        assert_eq!(LoraParameters::decode(&buf), Ok(LoraParameters::default()));
    }

    #[test]
    fn test_negative_power_is_twos_complement() {
        let params = LoraParameters {
            power: -17,
            ..LoraParameters::default()
        };
        let mut buf = Vec::new();
        params.encode_into(&mut buf);
        assert_eq!(buf[11], 0xEF);
    }

    #[test]
    fn test_module_status_decode() {
        let mut data = vec![0x01, 0x00];
        data.extend_from_slice(&60_000u32.to_be_bytes());
        data.extend_from_slice(&21.5f32.to_be_bytes());
        data.extend_from_slice(&370u32.to_be_bytes());
        data.extend_from_slice(&1760.0f32.to_be_bytes());

        let status = ModuleStatus::decode(&data).unwrap();
        assert!(status.lora_set);
        assert!(!status.unix_set);
        assert_eq!(status.uptime_ms, 60_000);
        assert_eq!(status.temperature, 21.5);
        assert_eq!(status.time_on_air, 370);
        assert_eq!(status.data_rate, 1760.0);

        assert!(matches!(
            ModuleStatus::decode(&data[..17]),
            Err(ProtocolError::FrameTooShort { expected: 18, actual: 17 })
        ));
    }

    #[test]
    fn test_mode_message_decode() {
        let decoded = ModeMessage::decode(b"\x01beacon").unwrap();
        assert_eq!(decoded.mode, Mode::Repeater);
        assert_eq!(decoded.message_text(), "beacon");
        assert!(ModeMessage::decode(&[]).is_err());
    }

    #[test]
    fn test_decode_unix_time() {
        assert_eq!(decode_unix_time(&1_700_000_000u32.to_be_bytes()), Ok(1_700_000_000));
        assert!(decode_unix_time(&[0, 1]).is_err());
    }
}
