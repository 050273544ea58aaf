//! Envelope framing and stream reassembly.
//!
//! Every packet on the serial link is wrapped in the same envelope. All
//! multi-byte fields are big-endian and `length` counts the whole envelope,
//! flags included.
//!
//! ```text
//! +------+----------+--------+-----------+-----------------+------+
//! | 0x7E | cls|seq  | length | timestamp | payload[0..265] | 0x7F |
//! | 1    | 1        | 2      | 4         | 0 - 265         | 1    |
//! +------+----------+--------+-----------+-----------------+------+
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};

use crate::constants::*;
use crate::error::ProtocolError;
use crate::responses::Payload;
use crate::sequence::SequenceCounter;
use crate::types::*;

/// A complete envelope. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    class: PacketClass,
    sequence: SequenceId,
    timestamp: u32,
    payload: Vec<u8>,
}

impl Envelope {
    /// Build an envelope. Payloads longer than
    /// [`PKT_MAX_DATA_PAYLOAD_LEN`] are truncated to fit.
    pub fn new(class: PacketClass, sequence: SequenceId, timestamp: u32, payload: &[u8]) -> Self {
        let payload = if payload.len() > PKT_MAX_DATA_PAYLOAD_LEN {
            log::debug!(
                "truncating {} payload from {} to {} bytes",
                class,
                payload.len(),
                PKT_MAX_DATA_PAYLOAD_LEN
            );
            &payload[..PKT_MAX_DATA_PAYLOAD_LEN]
        } else {
            payload
        };

        Envelope {
            class,
            sequence,
            timestamp,
            payload: payload.to_vec(),
        }
    }

    /// Packet class.
    pub fn class(&self) -> PacketClass {
        self.class
    }

    /// Sequence id.
    pub fn sequence(&self) -> SequenceId {
        self.sequence
    }

    /// UNIX time in seconds at which the envelope was framed.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total serialized length, as carried in the length field.
    pub fn length(&self) -> u16 {
        // The payload is capped at 265 bytes, so this never exceeds 274.
        (PKT_HEADER_TRAILER_LEN + self.payload.len()) as u16
    }

    /// The type/sequence byte.
    pub fn type_byte(&self) -> u8 {
        (self.class.tag() << PACKET_CLASS_SHIFT) | self.sequence.value()
    }

    /// Serialize for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.length() as usize);
        buf.put_u8(START_FLAG);
        buf.put_u8(self.type_byte());
        buf.put_u16(self.length());
        buf.put_u32(self.timestamp);
        buf.extend_from_slice(&self.payload);
        buf.put_u8(END_FLAG);
        buf
    }

    /// Parse exactly one envelope.
    ///
    /// `data` must hold the whole envelope and nothing else.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < PKT_HEADER_TRAILER_LEN {
            return Err(ProtocolError::FrameTooShort {
                expected: PKT_HEADER_TRAILER_LEN,
                actual: data.len(),
            });
        }
        if data.len() > PKT_MAX_LEN {
            return Err(ProtocolError::FrameTooLong {
                max: PKT_MAX_LEN,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let start = buf.get_u8();
        if start != START_FLAG {
            return Err(ProtocolError::MissingStartFlag(start));
        }

        let type_byte = buf.get_u8();
        let declared = buf.get_u16() as usize;
        if declared != data.len() {
            return Err(ProtocolError::LengthMismatch {
                declared,
                actual: data.len(),
            });
        }

        let end = data[data.len() - 1];
        if end != END_FLAG {
            return Err(ProtocolError::MissingEndFlag(end));
        }

        let class = PacketClass::try_from((type_byte & PACKET_CLASS_MASK) >> PACKET_CLASS_SHIFT)?;
        let timestamp = buf.get_u32();
        let payload = &data[PAYLOAD_INDEX..data.len() - PKT_TRAILER_LEN];

        Ok(Envelope {
            class,
            sequence: SequenceId::from_masked(type_byte),
            timestamp,
            payload: payload.to_vec(),
        })
    }

    /// Interpret the payload according to the packet class.
    pub fn decode_payload(&self) -> Result<Payload, ProtocolError> {
        Payload::decode(self.class, &self.payload)
    }
}

/// Current UNIX time in seconds, saturating at `u32::MAX`.
pub fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Wraps payloads in envelopes, one sequence id per envelope.
///
/// The framer owns the link's sequence counter. It takes `&self`, so a
/// single framer can be shared between threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct PacketFramer {
    counter: SequenceCounter,
}

impl PacketFramer {
    /// Create a framer whose first envelope gets id 0.
    pub fn new() -> Self {
        PacketFramer {
            counter: SequenceCounter::new(),
        }
    }

    /// Create a framer that draws ids from `counter`.
    pub fn with_counter(counter: SequenceCounter) -> Self {
        PacketFramer { counter }
    }

    /// Frame `payload`, stamped with the current time.
    pub fn frame(&self, payload: &[u8], class: PacketClass) -> Envelope {
        self.frame_at(payload, class, unix_now())
    }

    /// Frame `payload` with an explicit timestamp.
    pub fn frame_at(&self, payload: &[u8], class: PacketClass, timestamp: u32) -> Envelope {
        let sequence = self.counter.next();
        let envelope = Envelope::new(class, sequence, timestamp, payload);
        log::trace!(
            "framed {} #{} ({} bytes)",
            envelope.class(),
            envelope.sequence(),
            envelope.length()
        );
        envelope
    }

    /// The id the next envelope will carry.
    pub fn next_sequence(&self) -> SequenceId {
        self.counter.peek()
    }
}

/// Reassembles envelopes from a byte stream.
///
/// Bytes ahead of a start flag are discarded. A start flag followed by an
/// unknown class or an impossible length is treated as noise and skipped.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        FrameDecoder {
            buffer: BytesMut::with_capacity(PKT_MAX_LEN),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to take the next envelope from the buffer.
    ///
    /// Returns `None` when more data is needed, `Some(Err(_))` for a frame
    /// that was delimited but invalid. After an error the decoder has
    /// already moved past the bad frame's start byte, so calling again
    /// continues with the following data.
    pub fn decode(&mut self) -> Option<Result<Envelope, ProtocolError>> {
        loop {
            let skip = self
                .buffer
                .iter()
                .position(|&b| b == START_FLAG)
                .unwrap_or(self.buffer.len());
            if skip > 0 {
                log::debug!("discarding {} bytes before start flag", skip);
                self.buffer.advance(skip);
            }

            if self.buffer.len() < LENGTH_INDEX + 2 {
                return None;
            }

            let type_byte = self.buffer[TYPE_CYCLIC_FIELD_INDEX];
            let tag = (type_byte & PACKET_CLASS_MASK) >> PACKET_CLASS_SHIFT;
            if PacketClass::try_from(tag).is_err() {
                log::debug!("type byte 0x{:02X} names no class, resyncing", type_byte);
                self.buffer.advance(1);
                continue;
            }

            let declared =
                u16::from_be_bytes([self.buffer[LENGTH_INDEX], self.buffer[LENGTH_INDEX + 1]])
                    as usize;
            if !(PKT_HEADER_TRAILER_LEN..=PKT_MAX_LEN).contains(&declared) {
                log::debug!("length {} out of range, resyncing", declared);
                self.buffer.advance(1);
                continue;
            }

            if self.buffer.len() < declared {
                return None;
            }

            let end = self.buffer[declared - 1];
            if end != END_FLAG {
                log::debug!("no end flag at offset {}, resyncing", declared - 1);
                self.buffer.advance(1);
                return Some(Err(ProtocolError::MissingEndFlag(end)));
            }

            let frame = self.buffer.split_to(declared);
            let result = Envelope::decode(&frame);
            if let Ok(envelope) = &result {
                log::trace!(
                    "decoded {} #{} ({} bytes)",
                    envelope.class(),
                    envelope.sequence(),
                    declared
                );
            }
            return Some(result);
        }
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
