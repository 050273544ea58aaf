//! Receive loop for replies from the module.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use lcom_protocol::{Command, FrameDecoder, Inbound, Payload, ProtocolError, PKT_MAX_LEN};

/// Something that came off the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiveEvent {
    /// A decoded envelope.
    Frame(Inbound),
    /// A delimited frame that could not be decoded.
    Error(ProtocolError),
}

/// Totals for one receive session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    /// Bytes read from the source.
    pub bytes: usize,
    /// Envelopes decoded.
    pub frames: usize,
    /// Frames rejected.
    pub errors: usize,
}

/// Read from `source` until end of stream, a read error, or `stop` is set.
///
/// Read timeouts are not errors; they give the loop a chance to check
/// `stop`.
pub fn receive<R, F>(mut source: R, stop: &AtomicBool, mut on_event: F) -> ReceiveStats
where
    R: Read,
    F: FnMut(ReceiveEvent),
{
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; PKT_MAX_LEN];
    let mut stats = ReceiveStats::default();

    while !stop.load(Ordering::Relaxed) {
        let n = match source.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("receive source closed");
                break;
            }
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "read failed, stopping receiver");
                break;
            }
        };

        tracing::trace!(bytes = n, data = %hex::encode_upper(&buf[..n]), "read");
        stats.bytes += n;
        decoder.push(&buf[..n]);

        while let Some(result) = decoder.decode() {
            let event = match result.and_then(|envelope| {
                let payload = envelope.decode_payload()?;
                Ok(Inbound { envelope, payload })
            }) {
                Ok(inbound) => {
                    stats.frames += 1;
                    ReceiveEvent::Frame(inbound)
                }
                Err(err) => {
                    stats.errors += 1;
                    ReceiveEvent::Error(err)
                }
            };
            on_event(event);
        }
    }

    stats
}

/// Run [`receive`] on a thread, logging every event.
pub fn spawn_receiver(
    source: Box<dyn Read + Send>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<ReceiveStats> {
    thread::spawn(move || {
        let stats = receive(source, &stop, |event| log_event(&event));
        tracing::debug!(?stats, "receiver finished");
        stats
    })
}

/// Log one receive event.
pub fn log_event(event: &ReceiveEvent) {
    match event {
        ReceiveEvent::Frame(inbound) => {
            let envelope = &inbound.envelope;
            tracing::info!(
                class = %envelope.class(),
                seq = envelope.sequence().value(),
                time = %format_timestamp(envelope.timestamp()),
                "{}",
                describe(&inbound.payload)
            );
        }
        ReceiveEvent::Error(err) => {
            tracing::warn!(error = %err, "dropped frame");
        }
    }
}

/// Envelope timestamp as RFC 3339.
pub fn format_timestamp(timestamp: u32) -> String {
    DateTime::<Utc>::from_timestamp(timestamp as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

/// One-line description of a payload.
pub fn describe(payload: &Payload) -> String {
    match payload {
        Payload::Command(command) => match command {
            Command::SetLoraParameters(params) => format!("SetLoraParameters {:?}", params),
            Command::SetUnix { timestamp } => format!("SetUnix {}", format_timestamp(*timestamp)),
            Command::SetModeMessage { mode, message } => format!(
                "SetModeMessage {} {:?}",
                mode,
                String::from_utf8_lossy(message)
            ),
            other => other.name().to_string(),
        },
        Payload::Ack(ack) if ack.data.is_empty() => format!("ack: {}", ack.result),
        Payload::Ack(ack) => format!(
            "ack: {} data={}",
            ack.result,
            hex::encode_upper(&ack.data)
        ),
        Payload::Message(message) => format!(
            "message rssi={} snr={} result={}: {:?}",
            message.rssi,
            message.snr,
            message.result,
            message.message_text()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcom_protocol::{Ack, PacketClass, PacketFramer, RadioMessage, StatusCode};
    use std::io::Cursor;

    fn module_stream() -> Vec<u8> {
        let module = PacketFramer::new();
        let mut stream = b"\r\nready\r\n".to_vec();
        stream.extend(
            module
                .frame_at(&Ack::new(StatusCode::Ok).encode(), PacketClass::Ack, 0)
                .to_bytes(),
        );
        // An ack too short to hold a status code.
        stream.extend(module.frame_at(&[0x00], PacketClass::Ack, 0).to_bytes());
        let heard = RadioMessage {
            rssi: -80,
            snr: 9,
            result: StatusCode::Ok,
            message: b"pong".to_vec(),
        };
        stream.extend(module.frame_at(&heard.encode(), PacketClass::Message, 0).to_bytes());
        stream
    }

    #[test]
    fn test_receive_until_end_of_stream() {
        let stop = AtomicBool::new(false);
        let mut events = Vec::new();

        let stats = receive(Cursor::new(module_stream()), &stop, |event| events.push(event));

        assert_eq!(stats.frames, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ReceiveEvent::Frame(inbound)
            if inbound.payload == Payload::Ack(Ack::new(StatusCode::Ok))));
        assert!(matches!(
            events[1],
            ReceiveEvent::Error(ProtocolError::FrameTooShort { .. })
        ));
        match &events[2] {
            ReceiveEvent::Frame(inbound) => {
                assert_eq!(inbound.envelope.sequence().value(), 2);
                assert_eq!(describe(&inbound.payload), "message rssi=-80 snr=9 result=ok: \"pong\"");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_stop_flag_ends_receive() {
        let stop = AtomicBool::new(true);
        let stats = receive(Cursor::new(module_stream()), &stop, |_| {});
        assert_eq!(stats, ReceiveStats::default());
    }

    #[test]
    fn test_spawned_receiver_returns_stats() {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = spawn_receiver(Box::new(Cursor::new(module_stream())), stop);
        let stats = handle.join().expect("receiver should not panic");
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.bytes, module_stream().len());
    }

    #[test]
    fn test_describe_commands() {
        assert_eq!(describe(&Payload::Command(Command::GetUnix)), "GetUnix");
        assert_eq!(
            describe(&Payload::Command(Command::SetUnix { timestamp: 0 })),
            "SetUnix 1970-01-01T00:00:00+00:00"
        );
        assert_eq!(
            describe(&Payload::Ack(Ack::with_data(StatusCode::Ok, vec![0x12, 0xAB]))),
            "ack: ok data=12AB"
        );
    }
}
