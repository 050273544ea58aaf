//! Validated command building and inbound decoding over one link.

use crate::commands::Command;
use crate::error::{ProtocolError, StatusCode, ValidationError};
use crate::frame::{Envelope, FrameDecoder, PacketFramer};
use crate::responses::{Ack, Payload, RadioMessage};
use crate::types::PacketClass;
use crate::validate::*;

/// A decoded inbound envelope and its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    /// The envelope as received.
    pub envelope: Envelope,
    /// The payload interpreted by packet class.
    pub payload: Payload,
}

/// A simple synchronous interface for building envelopes and decoding
/// replies.
///
/// Builders validate first, so a rejected command leaves the sequence
/// counter untouched. This can be used with any byte stream (serial port,
/// pipe, file).
#[derive(Debug, Default)]
pub struct ProtocolSession {
    framer: PacketFramer,
    decoder: FrameDecoder,
}

impl ProtocolSession {
    /// Create a new protocol session.
    pub fn new() -> Self {
        ProtocolSession {
            framer: PacketFramer::new(),
            decoder: FrameDecoder::new(),
        }
    }

    /// Create a session around an existing framer.
    pub fn with_framer(framer: PacketFramer) -> Self {
        ProtocolSession {
            framer,
            decoder: FrameDecoder::new(),
        }
    }

    /// The session's framer.
    pub fn framer(&self) -> &PacketFramer {
        &self.framer
    }

    /// Frame an already-built command.
    pub fn command(&self, command: &Command) -> Envelope {
        log::debug!("framing {}", command.name());
        self.framer.frame(&command.encode(), PacketClass::Command)
    }

    /// Build SetLoraParameters.
    pub fn set_lora_parameters(&self, raw: &RawLoraParameters) -> Result<Envelope, ValidationError> {
        let params = validate_lora_parameters(raw)?;
        Ok(self.command(&Command::SetLoraParameters(params)))
    }

    /// Build SetUnix.
    pub fn set_unix(&self, timestamp: i64) -> Result<Envelope, ValidationError> {
        let timestamp = validate_unix_timestamp(timestamp)?;
        Ok(self.command(&Command::SetUnix { timestamp }))
    }

    /// Build SetModeMessage. An empty message keeps the stored one.
    pub fn set_mode_message(&self, mode: &str, message: &[u8]) -> Result<Envelope, ValidationError> {
        let accepted = validate_mode_message(mode, message)?;
        Ok(self.command(&Command::SetModeMessage {
            mode: accepted.mode,
            message: accepted.message,
        }))
    }

    /// Build GetLoraParameters.
    pub fn get_lora_parameters(&self) -> Envelope {
        self.command(&Command::GetLoraParameters)
    }

    /// Build GetUnix.
    pub fn get_unix(&self) -> Envelope {
        self.command(&Command::GetUnix)
    }

    /// Build GetModeMessage.
    pub fn get_mode_message(&self) -> Envelope {
        self.command(&Command::GetModeMessage)
    }

    /// Build GetModuleStatus.
    pub fn get_module_status(&self) -> Envelope {
        self.command(&Command::GetModuleStatus)
    }

    /// Build RadioReset.
    pub fn radio_reset(&self) -> Envelope {
        self.command(&Command::RadioReset)
    }

    /// Build SystemReset.
    pub fn system_reset(&self) -> Envelope {
        self.command(&Command::SystemReset)
    }

    /// Build NegotiateLoraParameters.
    pub fn negotiate_lora_parameters(&self) -> Envelope {
        self.command(&Command::NegotiateLoraParameters)
    }

    /// Build a LoRa message for the module to transmit.
    pub fn message(&self, text: &[u8]) -> Result<Envelope, ValidationError> {
        let message = validate_message(text)?;
        let payload = RadioMessage::outgoing(message).encode();
        Ok(self.framer.frame(&payload, PacketClass::Message))
    }

    /// Build an acknowledgment.
    pub fn ack(&self, result: StatusCode, data: &[u8]) -> Envelope {
        let payload = Ack::with_data(result, data.to_vec()).encode();
        self.framer.frame(&payload, PacketClass::Ack)
    }

    /// Feed received data into the decoder.
    pub fn feed(&mut self, data: &[u8]) {
        self.decoder.push(data);
    }

    /// Try to decode the next inbound envelope.
    ///
    /// Returns `Ok(Some(_))` if an envelope was decoded, `Ok(None)` if more
    /// data is needed, or `Err` if the next frame was invalid. Decoding can
    /// continue after an error.
    pub fn try_decode(&mut self) -> Result<Option<Inbound>, ProtocolError> {
        match self.decoder.decode() {
            Some(result) => {
                let envelope = result?;
                let payload = envelope.decode_payload()?;
                Ok(Some(Inbound { envelope, payload }))
            }
            None => Ok(None),
        }
    }

    /// Drop any partially received data.
    pub fn reset(&mut self) {
        self.decoder.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Field;
    use crate::types::Mode;

    #[test]
    fn test_rejected_command_does_not_consume_an_id() {
        let session = ProtocolSession::new();

        let first = session.ack(StatusCode::Ok, &[]);
        let second = session.ack(StatusCode::Ok, &[]);

        let bad = RawLoraParameters {
            spreading_factor: 13,
            ..RawLoraParameters::default()
        };
        let err = session.set_lora_parameters(&bad).unwrap_err();
        assert_eq!(err.field(), Field::SpreadingFactor);

        let third = session.ack(StatusCode::Ok, &[]);

        assert_eq!(first.sequence().value(), 0);
        assert_eq!(second.sequence().value(), 1);
        assert_eq!(third.sequence().value(), 2);
    }

    #[test]
    fn test_every_builder_consumes_one_id() {
        let session = ProtocolSession::new();
        let envelopes = vec![
            session.set_lora_parameters(&RawLoraParameters::default()).unwrap(),
            session.set_unix(1_700_000_000).unwrap(),
            session.set_mode_message("Normal", b"").unwrap(),
            session.get_lora_parameters(),
            session.get_unix(),
            session.get_mode_message(),
            session.get_module_status(),
            session.radio_reset(),
            session.system_reset(),
            session.negotiate_lora_parameters(),
            session.message(b"hello").unwrap(),
        ];

        for (i, envelope) in envelopes.iter().enumerate() {
            assert_eq!(envelope.sequence().value() as usize, i);
        }
        assert_eq!(envelopes[10].class(), PacketClass::Message);
        assert_eq!(session.framer().next_sequence().value(), 11);
    }

    #[test]
    fn test_set_unix_payload_position() {
        let session = ProtocolSession::new();
        let envelope = session.set_unix(1_700_000_000).unwrap();

        assert_eq!(envelope.class(), PacketClass::Command);
        assert_eq!(&envelope.payload()[1..5], &1_700_000_000u32.to_be_bytes());
        assert!(session.set_unix(-5).is_err());
    }

    #[test]
    fn test_message_rejects_empty_text() {
        let session = ProtocolSession::new();
        assert!(session.message(b"").is_err());
        assert!(session.set_mode_message("Beacon", b"x").is_err());
        assert_eq!(session.framer().next_sequence().value(), 0);
    }

    #[test]
    fn test_decode_inbound_reply() {
        let module = ProtocolSession::new();
        let mut host = ProtocolSession::new();

        let reply = module.ack(StatusCode::Ok, &[0x01, b'b', b'e', b'e', b'p']);
        host.feed(&reply.to_bytes()[..6]);
        assert_eq!(host.try_decode(), Ok(None));
        host.feed(&reply.to_bytes()[6..]);

        let inbound = host.try_decode().unwrap().expect("should decode reply");
        assert_eq!(inbound.envelope, reply);
        match inbound.payload {
            Payload::Ack(ack) => {
                let accepted = ack.mode_message().unwrap();
                assert_eq!(accepted.mode, Mode::Repeater);
                assert_eq!(accepted.message_text(), "beep");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_then_recover() {
        let module = ProtocolSession::new();
        let mut host = ProtocolSession::new();

        // A command envelope whose id is unknown.
        let bogus = module.framer().frame(&[0x55], PacketClass::Command);
        let good = module.radio_reset();
        host.feed(&bogus.to_bytes());
        host.feed(&good.to_bytes());

        assert_eq!(host.try_decode(), Err(ProtocolError::UnknownCommand(0x55)));
        let inbound = host.try_decode().unwrap().unwrap();
        assert_eq!(inbound.payload, Payload::Command(Command::RadioReset));
    }

    #[test]
    fn test_reset_drops_partial_frame() {
        let module = ProtocolSession::new();
        let mut host = ProtocolSession::new();
        let bytes = module.get_unix().to_bytes();

        host.feed(&bytes[..5]);
        host.reset();
        host.feed(&bytes);
        assert!(host.try_decode().unwrap().is_some());
        assert_eq!(host.try_decode(), Ok(None));
    }
}
