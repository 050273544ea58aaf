//! Byte sinks that envelopes are written to.

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use serialport::SerialPort;

use crate::config::HostConfig;
use crate::error::HostResult;

/// A blocking sink for serialized envelopes.
pub trait Transport {
    /// Write one serialized envelope.
    fn send(&mut self, bytes: &[u8]) -> HostResult<()>;
}

/// Serial link to the module.
///
/// Bytes are written one at a time with a pause after each, since the
/// module firmware polls its UART a byte at a time.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    inter_byte_delay: Duration,
}

impl SerialTransport {
    /// Open the configured port.
    pub fn open(path: &str, config: &HostConfig) -> HostResult<Self> {
        let port = serialport::new(path, config.baud_rate)
            .timeout(config.read_timeout())
            .open()?;
        tracing::info!(port = path, baud = config.baud_rate, "opened serial port");

        Ok(SerialTransport {
            port,
            inter_byte_delay: config.inter_byte_delay(),
        })
    }

    /// A second handle on the port for the receive side.
    pub fn reader(&self) -> HostResult<Box<dyn Read + Send>> {
        Ok(Box::new(self.port.try_clone()?))
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, bytes: &[u8]) -> HostResult<()> {
        write_paced(&mut self.port, bytes, self.inter_byte_delay)?;
        tracing::debug!(bytes = bytes.len(), "sent envelope");
        Ok(())
    }
}

/// Raw bytes to any writer.
#[derive(Debug)]
pub struct WriterTransport<W: Write> {
    writer: W,
    inter_byte_delay: Duration,
}

impl<W: Write> WriterTransport<W> {
    /// Write without pacing.
    pub fn new(writer: W) -> Self {
        WriterTransport {
            writer,
            inter_byte_delay: Duration::ZERO,
        }
    }

    /// Write with a pause after each byte.
    pub fn with_delay(writer: W, inter_byte_delay: Duration) -> Self {
        WriterTransport {
            writer,
            inter_byte_delay,
        }
    }

    /// Take back the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn send(&mut self, bytes: &[u8]) -> HostResult<()> {
        write_paced(&mut self.writer, bytes, self.inter_byte_delay)?;
        Ok(())
    }
}

/// One line of hex per envelope, for `--dry-run`.
#[derive(Debug)]
pub struct HexTransport<W: Write> {
    writer: W,
}

impl<W: Write> HexTransport<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        HexTransport { writer }
    }

    /// Take back the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for HexTransport<W> {
    fn send(&mut self, bytes: &[u8]) -> HostResult<()> {
        writeln!(self.writer, "{}", hex::encode_upper(bytes))?;
        self.writer.flush()?;
        Ok(())
    }
}

fn write_paced<W: Write + ?Sized>(writer: &mut W, bytes: &[u8], delay: Duration) -> std::io::Result<()> {
    if delay.is_zero() {
        writer.write_all(bytes)?;
    } else {
        for byte in bytes {
            writer.write_all(std::slice::from_ref(byte))?;
            writer.flush()?;
            thread::sleep(delay);
        }
    }
    writer.flush()
}
