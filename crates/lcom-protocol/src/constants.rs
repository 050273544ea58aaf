//! Protocol constants
//!
//! Envelope layout, command identifiers, status codes and radio parameter
//! limits shared by the host and the L-COM module firmware.

// ============================================================================
// Envelope Layout
// ============================================================================

/// Marks the first byte of every envelope.
pub const START_FLAG: u8 = 0x7E;
/// Marks the last byte of every envelope.
pub const END_FLAG: u8 = 0x7F;

/// Maximum size of a complete envelope on the wire.
pub const PKT_MAX_LEN: usize = 274;
/// Bytes before the payload: start flag, type/sequence, length, timestamp.
pub const PKT_HEADER_LEN: usize = 8;
/// Bytes after the payload: end flag.
pub const PKT_TRAILER_LEN: usize = 1;
/// Header plus trailer; also the size of an envelope with an empty payload.
pub const PKT_HEADER_TRAILER_LEN: usize = PKT_HEADER_LEN + PKT_TRAILER_LEN;
/// Largest payload an envelope can carry. Longer payloads are truncated.
pub const PKT_MAX_DATA_PAYLOAD_LEN: usize = PKT_MAX_LEN - PKT_HEADER_TRAILER_LEN;

/// Offset of the type/sequence byte.
pub const TYPE_CYCLIC_FIELD_INDEX: usize = 1;
/// Offset of the 16-bit length field.
pub const LENGTH_INDEX: usize = 2;
/// Offset of the 32-bit timestamp field.
pub const UNIX_TIME_INDEX: usize = 4;
/// Offset of the first payload byte.
pub const PAYLOAD_INDEX: usize = 8;

/// Mask selecting the packet class bits of the type/sequence byte.
pub const PACKET_CLASS_MASK: u8 = 0b1110_0000;
/// Mask selecting the sequence id bits of the type/sequence byte.
pub const SEQUENCE_MASK: u8 = 0b0001_1111;
/// Shift applied to a packet class tag.
pub const PACKET_CLASS_SHIFT: u8 = 5;
/// Number of distinct sequence ids.
pub const SEQUENCE_MODULUS: u8 = 32;

/// Class tag of acknowledgment envelopes.
pub const ACK_PACKET: u8 = 0b000;
/// Class tag of command envelopes.
pub const COMMAND_PACKET: u8 = 0b001;
/// Class tag of LoRa message envelopes.
pub const MESSAGE_PACKET: u8 = 0b010;

// ============================================================================
// Command Identifiers (first payload byte of command envelopes)
// ============================================================================

/// Set the LoRa radio parameters.
pub const SET_LORA_PARAMETERS: u8 = 0x00;
/// Set the module's UNIX time.
pub const SET_UNIX: u8 = 0x01;
/// Set the operating mode and repeater message.
pub const SET_MODE_MESSAGE: u8 = 0x02;

/// Read back the LoRa radio parameters.
pub const GET_LORA_PARAMETERS: u8 = 0x10;
/// Read back the module's UNIX time.
pub const GET_UNIX: u8 = 0x11;
/// Read back the operating mode and repeater message.
pub const GET_MODE_MESSAGE: u8 = 0x12;
/// Read the module status block.
pub const GET_MODULE_STATUS: u8 = 0x13;

/// Reset the radio chip.
pub const RADIO_RESET: u8 = 0x20;
/// Reset the whole module.
pub const SYSTEM_RESET: u8 = 0x21;
/// Negotiate LoRa parameters with the remote peer.
pub const NEGOTIATE_LORA_PARAMETERS: u8 = 0x22;

// ============================================================================
// Payload Lengths (command id included)
// ============================================================================

/// SetLoraParameters: id + 2x f32 + 4x u8 + u16 + f32.
pub const SET_LORA_PARAMETERS_PAYLOAD_LEN: usize = 19;
/// SetUnix: id + u32.
pub const SET_UNIX_PAYLOAD_LEN: usize = 5;
/// SetModeMessage without its message: id + mode.
pub const SET_MODE_MESSAGE_HEADER_LEN: usize = 2;
/// Any command that carries only its id.
pub const BARE_COMMAND_PAYLOAD_LEN: usize = 1;

/// Ack payload header: result.
pub const ACK_HEADER_LEN: usize = 2;
/// Message payload header: RSSI + SNR + result.
pub const MESSAGE_HEADER_LEN: usize = 10;

/// Return data of GetLoraParameters.
pub const GET_LORA_PARAMETERS_RETURN_LEN: usize = 18;
/// Return data of GetUnix.
pub const GET_UNIX_RETURN_LEN: usize = 4;
/// Return data of GetModuleStatus.
pub const GET_MODULE_STATUS_RETURN_LEN: usize = 18;

// ============================================================================
// Status Codes
// ============================================================================

/// Command executed successfully.
pub const CMD_OK: u16 = 0x0000;
/// Command payload had the wrong size.
pub const CMD_MALFORMED_PAYLOAD: u16 = 0x0101;
/// Command id not recognised by the firmware.
pub const CMD_UNKNOWN_COMMAND: u16 = 0x0102;
/// Frequency outside 150.0 - 960.0 MHz.
pub const CMD_INVALID_FREQUENCY: u16 = 0x0103;
/// Bandwidth outside 0.0 - 510.0 kHz.
pub const CMD_INVALID_BANDWIDTH: u16 = 0x0104;
/// Spreading factor outside 5 - 12.
pub const CMD_INVALID_SPREADING_FACTOR: u16 = 0x0105;
/// Coding rate outside 5 - 8.
pub const CMD_INVALID_CODING_RATE: u16 = 0x0106;
/// Sync word is the reserved LoRaWAN value.
pub const CMD_INVALID_SYNC_WORD: u16 = 0x0107;
/// Power outside -17 - 22 dBm.
pub const CMD_INVALID_POWER: u16 = 0x0108;
/// Preamble shorter than 6 symbols.
pub const CMD_INVALID_PREAMBLE_LENGTH: u16 = 0x0109;
/// Current limit outside 0 - 140 mA.
pub const CMD_INVALID_CURRENT_LIMIT: u16 = 0x0110;
/// Envelope failed verification on the module.
pub const MALFORMED_PACKET: u16 = 0x0301;
/// Envelope did not begin with the start flag.
pub const MISPLACED_START_FLAG: u16 = 0x0304;
/// Envelope did not end with the end flag where its length said.
pub const MISPLACED_END_FLAG: u16 = 0x0305;

// ============================================================================
// Modes
// ============================================================================

/// Normal operation.
pub const NORMAL_MODE: u8 = 0x00;
/// Repeat the configured message.
pub const REPEATER_MODE: u8 = 0x01;

// ============================================================================
// Messages
// ============================================================================

/// Longest message a single LoRa transmission can carry.
pub const MAX_LORA_MESSAGE_LENGTH: usize = 255;

// ============================================================================
// LoRa Parameter Defaults
// ============================================================================

/// Default carrier frequency in MHz.
pub const DEFAULT_FREQUENCY: f32 = 915.0;
/// Default bandwidth in kHz.
pub const DEFAULT_BANDWIDTH: f32 = 125.0;
/// Default spreading factor.
pub const DEFAULT_SPREADING_FACTOR: u8 = 9;
/// Default coding rate denominator.
pub const DEFAULT_CODING_RATE: u8 = 7;
/// Default sync word (private network).
pub const DEFAULT_SYNC_WORD: u8 = 0x12;
/// Default output power in dBm.
pub const DEFAULT_POWER: i8 = 14;
/// Default preamble length in symbols.
pub const DEFAULT_PREAMBLE_LENGTH: u16 = 8;
/// Default over-current protection limit in mA.
pub const DEFAULT_CURRENT_LIMIT: f32 = 60.0;

// ============================================================================
// LoRa Parameter Limits
// ============================================================================

/// Lowest accepted frequency in MHz.
pub const MIN_FREQUENCY: f64 = 150.0;
/// Highest accepted frequency in MHz.
pub const MAX_FREQUENCY: f64 = 960.0;
/// Lowest accepted bandwidth in kHz.
pub const MIN_BANDWIDTH: f64 = 0.0;
/// Highest accepted bandwidth in kHz.
pub const MAX_BANDWIDTH: f64 = 510.0;
/// Lowest accepted spreading factor.
pub const MIN_SPREADING_FACTOR: i64 = 5;
/// Highest accepted spreading factor.
pub const MAX_SPREADING_FACTOR: i64 = 12;
/// Lowest accepted coding rate.
pub const MIN_CODING_RATE: i64 = 5;
/// Highest accepted coding rate.
pub const MAX_CODING_RATE: i64 = 8;
/// Lowest sync word.
pub const MIN_SYNC_WORD: i64 = 0;
/// Highest sync word.
pub const MAX_SYNC_WORD: i64 = 255;
/// Public LoRaWAN sync word; never accepted.
pub const LORAWAN_SYNC_WORD: u8 = 0x34;
/// Lowest accepted power in dBm.
pub const MIN_POWER: i64 = -17;
/// Highest accepted power in dBm.
pub const MAX_POWER: i64 = 22;
/// Shortest accepted preamble.
pub const MIN_PREAMBLE_LENGTH: i64 = 6;
/// Longest accepted preamble.
pub const MAX_PREAMBLE_LENGTH: i64 = 65535;
/// Lowest accepted current limit in mA.
pub const MIN_CURRENT_LIMIT: f64 = 0.0;
/// Highest accepted current limit in mA.
pub const MAX_CURRENT_LIMIT: f64 = 140.0;
