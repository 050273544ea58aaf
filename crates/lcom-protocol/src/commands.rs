//! Commands that can be sent to the L-COM module.
//!
//! A command payload always begins with the command id. Only three commands
//! carry arguments; the rest are the id alone.

use bytes::{Buf, BufMut};

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::*;

/// Commands that can be sent to the L-COM module.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Configure the radio.
    SetLoraParameters(LoraParameters),

    /// Set the module clock.
    SetUnix {
        /// UNIX time in seconds.
        timestamp: u32,
    },

    /// Set the operating mode and repeater message.
    SetModeMessage {
        /// New mode.
        mode: Mode,
        /// Repeater message. Empty keeps the message already stored.
        message: Vec<u8>,
    },

    /// Read back the radio configuration.
    GetLoraParameters,

    /// Read back the module clock.
    GetUnix,

    /// Read back the mode and repeater message.
    GetModeMessage,

    /// Read the module status block.
    GetModuleStatus,

    /// Reset the radio chip.
    RadioReset,

    /// Reset the whole module.
    SystemReset,

    /// Agree on radio parameters with the remote module.
    NegotiateLoraParameters,
}

impl Command {
    /// Get the command id.
    pub fn code(&self) -> u8 {
        match self {
            Command::SetLoraParameters(_) => SET_LORA_PARAMETERS,
            Command::SetUnix { .. } => SET_UNIX,
            Command::SetModeMessage { .. } => SET_MODE_MESSAGE,
            Command::GetLoraParameters => GET_LORA_PARAMETERS,
            Command::GetUnix => GET_UNIX,
            Command::GetModeMessage => GET_MODE_MESSAGE,
            Command::GetModuleStatus => GET_MODULE_STATUS,
            Command::RadioReset => RADIO_RESET,
            Command::SystemReset => SYSTEM_RESET,
            Command::NegotiateLoraParameters => NEGOTIATE_LORA_PARAMETERS,
        }
    }

    /// Short operator-facing name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetLoraParameters(_) => "SetLoraParameters",
            Command::SetUnix { .. } => "SetUnix",
            Command::SetModeMessage { .. } => "SetModeMessage",
            Command::GetLoraParameters => "GetLoraParameters",
            Command::GetUnix => "GetUnix",
            Command::GetModeMessage => "GetModeMessage",
            Command::GetModuleStatus => "GetModuleStatus",
            Command::RadioReset => "RadioReset",
            Command::SystemReset => "SystemReset",
            Command::NegotiateLoraParameters => "NegotiateLoraParameters",
        }
    }

    /// Encode the command payload (without envelope framing).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SET_LORA_PARAMETERS_PAYLOAD_LEN);
        buf.put_u8(self.code());

        match self {
            Command::SetLoraParameters(params) => {
                params.encode_into(&mut buf);
            }

            Command::SetUnix { timestamp } => {
                buf.put_u32(*timestamp);
            }

            Command::SetModeMessage { mode, message } => {
                buf.put_u8((*mode).into());
                buf.extend_from_slice(message);
            }

            Command::GetLoraParameters
            | Command::GetUnix
            | Command::GetModeMessage
            | Command::GetModuleStatus
            | Command::RadioReset
            | Command::SystemReset
            | Command::NegotiateLoraParameters => {}
        }

        buf
    }

    /// Decode a command payload.
    ///
    /// Payload sizes are exact: a command with trailing bytes is as malformed
    /// as one that is cut short. SetModeMessage is the only variable-size
    /// command.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        let (&code, mut args) = payload.split_first().ok_or(ProtocolError::FrameTooShort {
            expected: BARE_COMMAND_PAYLOAD_LEN,
            actual: 0,
        })?;

        let expect_len = |expected: usize| {
            if payload.len() == expected {
                Ok(())
            } else {
                Err(ProtocolError::MalformedPayload {
                    command: code,
                    expected,
                    actual: payload.len(),
                })
            }
        };

        let command = match code {
            SET_LORA_PARAMETERS => {
                expect_len(SET_LORA_PARAMETERS_PAYLOAD_LEN)?;
                Command::SetLoraParameters(LoraParameters::decode(args)?)
            }

            SET_UNIX => {
                expect_len(SET_UNIX_PAYLOAD_LEN)?;
                Command::SetUnix {
                    timestamp: args.get_u32(),
                }
            }

            SET_MODE_MESSAGE => {
                let message_len = payload.len().saturating_sub(SET_MODE_MESSAGE_HEADER_LEN);
                if payload.len() < SET_MODE_MESSAGE_HEADER_LEN
                    || message_len > MAX_LORA_MESSAGE_LENGTH
                {
                    return Err(ProtocolError::MalformedPayload {
                        command: code,
                        expected: SET_MODE_MESSAGE_HEADER_LEN,
                        actual: payload.len(),
                    });
                }
                let mode = Mode::try_from(args.get_u8())?;
                Command::SetModeMessage {
                    mode,
                    message: args.to_vec(),
                }
            }

            GET_LORA_PARAMETERS => {
                expect_len(BARE_COMMAND_PAYLOAD_LEN)?;
                Command::GetLoraParameters
            }
            GET_UNIX => {
                expect_len(BARE_COMMAND_PAYLOAD_LEN)?;
                Command::GetUnix
            }
            GET_MODE_MESSAGE => {
                expect_len(BARE_COMMAND_PAYLOAD_LEN)?;
                Command::GetModeMessage
            }
            GET_MODULE_STATUS => {
                expect_len(BARE_COMMAND_PAYLOAD_LEN)?;
                Command::GetModuleStatus
            }
            RADIO_RESET => {
                expect_len(BARE_COMMAND_PAYLOAD_LEN)?;
                Command::RadioReset
            }
            SYSTEM_RESET => {
                expect_len(BARE_COMMAND_PAYLOAD_LEN)?;
                Command::SystemReset
            }
            NEGOTIATE_LORA_PARAMETERS => {
                expect_len(BARE_COMMAND_PAYLOAD_LEN)?;
                Command::NegotiateLoraParameters
            }

            other => return Err(ProtocolError::UnknownCommand(other)),
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_unix_payload() {
        let payload = Command::SetUnix {
            timestamp: 1_700_000_000,
        }
        .encode();

        assert_eq!(payload, vec![0x01, 0x65, 0x53, 0xF1, 0x00]);
    }

    #[test]
    fn test_set_lora_parameters_payload() {
        let payload = Command::SetLoraParameters(LoraParameters::default()).encode();

        assert_eq!(payload.len(), SET_LORA_PARAMETERS_PAYLOAD_LEN);
        assert_eq!(payload[0], SET_LORA_PARAMETERS);
        assert_eq!(&payload[1..5], &915.0f32.to_be_bytes());
        assert_eq!(&payload[13..15], &[0x00, 0x08]);
    }

    #[test]
    fn test_set_mode_message_has_no_padding() {
        let payload = Command::SetModeMessage {
            mode: Mode::Repeater,
            message: b"hello".to_vec(),
        }
        .encode();
        assert_eq!(payload, b"\x02\x01hello".to_vec());

        let payload = Command::SetModeMessage {
            mode: Mode::Normal,
            message: Vec::new(),
        }
        .encode();
        assert_eq!(payload, vec![0x02, 0x00]);
    }

    #[test]
    fn test_bare_commands_are_one_byte() {
        let cases = [
            (Command::GetLoraParameters, 0x10),
            (Command::GetUnix, 0x11),
            (Command::GetModeMessage, 0x12),
            (Command::GetModuleStatus, 0x13),
            (Command::RadioReset, 0x20),
            (Command::SystemReset, 0x21),
            (Command::NegotiateLoraParameters, 0x22),
        ];

        for (command, code) in cases {
            assert_eq!(command.encode(), vec![code], "{}", command.name());
            assert_eq!(Command::decode(&[code]), Ok(command));
        }
    }

    #[test]
    fn test_decode_recovers_arguments() {
        let command = Command::SetModeMessage {
            mode: Mode::Repeater,
            message: b"beacon".to_vec(),
        };
        assert_eq!(Command::decode(&command.encode()), Ok(command));

        let params = LoraParameters {
            frequency: 868.1,
            power: -3,
            ..LoraParameters::default()
        };
        let command = Command::SetLoraParameters(params);
        assert_eq!(Command::decode(&command.encode()), Ok(command));
    }

    #[test]
    fn test_decode_rejects_wrong_sizes() {
        assert!(matches!(
            Command::decode(&[SET_UNIX, 0, 0, 0]),
            Err(ProtocolError::MalformedPayload {
                command: SET_UNIX,
                expected: 5,
                actual: 4
            })
        ));
        assert!(matches!(
            Command::decode(&[GET_UNIX, 0]),
            Err(ProtocolError::MalformedPayload { expected: 1, .. })
        ));
        assert!(matches!(
            Command::decode(&[SET_LORA_PARAMETERS; 20]),
            Err(ProtocolError::MalformedPayload { expected: 19, .. })
        ));
        assert!(matches!(
            Command::decode(&[SET_MODE_MESSAGE]),
            Err(ProtocolError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_ids() {
        assert_eq!(Command::decode(&[0x03]), Err(ProtocolError::UnknownCommand(0x03)));
        assert_eq!(Command::decode(&[0xFF]), Err(ProtocolError::UnknownCommand(0xFF)));
        assert!(matches!(
            Command::decode(&[]),
            Err(ProtocolError::FrameTooShort { .. })
        ));
        assert_eq!(
            Command::decode(&[SET_MODE_MESSAGE, 0x07]),
            Err(ProtocolError::UnknownMode(0x07))
        );
    }
}
