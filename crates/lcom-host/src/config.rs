//! Host configuration file.
//!
//! Every key is optional:
//!
//! ```yaml
//! port: /dev/ttyUSB0
//! baud_rate: 115200
//! inter_byte_delay_ms: 30
//! read_timeout_ms: 100
//! listen_after_send_ms: 0
//! lora:
//!   frequency: 915.0
//!   spreading_factor: 9
//!   sync_word: 18
//! ```

use std::path::Path;
use std::time::Duration;

use lcom_protocol::RawLoraParameters;
use serde::Deserialize;

use crate::error::{HostError, HostResult};

/// Baud rate the module firmware listens at.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
/// Pause between written bytes; the module reads one byte at a time.
pub const DEFAULT_INTER_BYTE_DELAY_MS: u64 = 30;
/// Serial read timeout.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Serial device, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: Option<String>,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Delay after each written byte, in milliseconds.
    pub inter_byte_delay_ms: u64,
    /// Serial read timeout, in milliseconds.
    pub read_timeout_ms: u64,
    /// How long to keep reading replies after sending, in milliseconds.
    pub listen_after_send_ms: u64,
    /// Radio parameters used where `set-lora` flags are omitted.
    pub lora: LoraConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            inter_byte_delay_ms: DEFAULT_INTER_BYTE_DELAY_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            listen_after_send_ms: 0,
            lora: LoraConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> HostResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| HostError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse config from YAML text. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> HostResult<Self> {
        if text.trim().is_empty() {
            return Ok(HostConfig::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Inter-byte delay as a duration.
    pub fn inter_byte_delay(&self) -> Duration {
        Duration::from_millis(self.inter_byte_delay_ms)
    }

    /// Read timeout as a duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Default radio parameters. Values are checked only when a command is
/// built from them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoraConfig {
    pub frequency: f64,
    pub bandwidth: f64,
    pub spreading_factor: i64,
    pub coding_rate: i64,
    pub sync_word: i64,
    pub power: i64,
    pub preamble_length: i64,
    pub current_limit: f64,
}

impl Default for LoraConfig {
    fn default() -> Self {
        let raw = RawLoraParameters::default();
        LoraConfig {
            frequency: raw.frequency,
            bandwidth: raw.bandwidth,
            spreading_factor: raw.spreading_factor,
            coding_rate: raw.coding_rate,
            sync_word: raw.sync_word,
            power: raw.power,
            preamble_length: raw.preamble_length,
            current_limit: raw.current_limit,
        }
    }
}

impl From<&LoraConfig> for RawLoraParameters {
    fn from(config: &LoraConfig) -> Self {
        RawLoraParameters {
            frequency: config.frequency,
            bandwidth: config.bandwidth,
            spreading_factor: config.spreading_factor,
            coding_rate: config.coding_rate,
            sync_word: config.sync_word,
            power: config.power,
            preamble_length: config.preamble_length,
            current_limit: config.current_limit,
        }
    }
}
