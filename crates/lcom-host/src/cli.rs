//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lcom_protocol::{parse_integer, Envelope, Field, ProtocolSession, RawLoraParameters};

use crate::config::HostConfig;
use crate::error::HostResult;

#[derive(Parser, Debug)]
#[command(name = "lcom", version, about = "Configure and message through an L-COM LoRa module")]
pub struct Cli {
    /// YAML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Serial device; overrides the config file.
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Baud rate; overrides the config file.
    #[arg(long, global = true)]
    pub baud_rate: Option<u32>,

    /// Print the envelope as hex instead of sending it.
    #[arg(long, global = true, default_value_t = false)]
    pub dry_run: bool,

    /// Keep reading replies for this many milliseconds after sending.
    #[arg(long, global = true)]
    pub listen_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Apply command-line overrides to a loaded config.
    pub fn apply_overrides(&self, config: &mut HostConfig) {
        if let Some(port) = &self.port {
            config.port = Some(port.clone());
        }
        if let Some(baud_rate) = self.baud_rate {
            config.baud_rate = baud_rate;
        }
        if let Some(listen_ms) = self.listen_ms {
            config.listen_after_send_ms = listen_ms;
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Configure the radio. Omitted values come from the config file.
    SetLora(LoraArgs),

    /// Set the module clock. Defaults to the current time.
    SetUnix {
        /// UNIX time in seconds.
        #[arg(allow_hyphen_values = true)]
        timestamp: Option<String>,
    },

    /// Set the operating mode and repeater message.
    SetMode {
        /// Normal or Repeater.
        mode: String,
        /// Repeater message; omit to keep the stored one.
        message: Option<String>,
    },

    /// Read back the radio configuration.
    GetLora,

    /// Read back the module clock.
    GetUnix,

    /// Read back the mode and repeater message.
    GetMode,

    /// Read the module status block.
    GetStatus,

    /// Reset the radio chip.
    RadioReset,

    /// Reset the module.
    SystemReset,

    /// Agree on radio parameters with the remote module.
    Negotiate,

    /// Transmit a message over LoRa.
    Message {
        /// Message text, 1-255 bytes.
        text: String,
    },

    /// Print everything the module sends until Ctrl-C.
    Listen,
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct LoraArgs {
    /// Carrier frequency in MHz (150-960).
    #[arg(long)]
    pub frequency: Option<String>,
    /// Bandwidth in kHz (0-510).
    #[arg(long)]
    pub bandwidth: Option<String>,
    /// Spreading factor (5-12).
    #[arg(long)]
    pub spreading_factor: Option<String>,
    /// Coding rate (5-8).
    #[arg(long)]
    pub coding_rate: Option<String>,
    /// Sync word (0-255, not 0x34).
    #[arg(long)]
    pub sync_word: Option<String>,
    /// Output power in dBm (-17 to 22).
    #[arg(long, allow_hyphen_values = true)]
    pub power: Option<String>,
    /// Preamble length in symbols (6-65535).
    #[arg(long)]
    pub preamble_length: Option<String>,
    /// Current limit in mA (0-140).
    #[arg(long)]
    pub current_limit: Option<String>,
}

impl LoraArgs {
    /// Config defaults with every given flag parsed over them.
    pub fn to_raw(&self, config: &HostConfig) -> HostResult<RawLoraParameters> {
        let mut raw = RawLoraParameters::from(&config.lora);
        let fields = [
            (Field::Frequency, &self.frequency),
            (Field::Bandwidth, &self.bandwidth),
            (Field::SpreadingFactor, &self.spreading_factor),
            (Field::CodingRate, &self.coding_rate),
            (Field::SyncWord, &self.sync_word),
            (Field::Power, &self.power),
            (Field::PreambleLength, &self.preamble_length),
            (Field::CurrentLimit, &self.current_limit),
        ];
        for (field, text) in fields {
            if let Some(text) = text {
                raw.set_from_text(field, text)?;
            }
        }
        Ok(raw)
    }
}

/// Build the envelope for a subcommand. `listen` sends nothing.
///
/// Validation happens here, before anything touches the port.
pub fn build_envelope(
    command: &Command,
    session: &ProtocolSession,
    config: &HostConfig,
) -> HostResult<Option<Envelope>> {
    let envelope = match command {
        Command::SetLora(args) => session.set_lora_parameters(&args.to_raw(config)?)?,
        Command::SetUnix { timestamp } => {
            let timestamp = match timestamp {
                Some(text) => parse_integer(Field::UnixTimestamp, text)?,
                None => chrono::Utc::now().timestamp(),
            };
            session.set_unix(timestamp)?
        }
        Command::SetMode { mode, message } => {
            let message = message.as_deref().unwrap_or_default();
            session.set_mode_message(mode, message.as_bytes())?
        }
        Command::GetLora => session.get_lora_parameters(),
        Command::GetUnix => session.get_unix(),
        Command::GetMode => session.get_mode_message(),
        Command::GetStatus => session.get_module_status(),
        Command::RadioReset => session.radio_reset(),
        Command::SystemReset => session.system_reset(),
        Command::Negotiate => session.negotiate_lora_parameters(),
        Command::Message { text } => session.message(text.as_bytes())?,
        Command::Listen => return Ok(None),
    };
    Ok(Some(envelope))
}
