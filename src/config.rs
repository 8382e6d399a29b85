//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{LinkError, Result};
use crate::radio::{DataRate, TxPower};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration (host to modem)
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Radio configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    #[serde(default = "default_channel")]
    pub channel: u8,

    #[serde(default = "default_pan_id")]
    pub pan_id: u16,

    #[serde(default = "default_rate")]
    pub rate_kbps: DataRate,

    #[serde(default = "default_tx_power")]
    pub tx_power_mw: TxPower,

    #[serde(default = "default_addr_type")]
    pub addr_type: u8,

    #[serde(default = "default_tx_retry")]
    pub tx_retry: u8,

    #[serde(default = "default_ack_request")]
    pub ack_request: bool,

    #[serde(default = "default_broadcast_enabled")]
    pub broadcast_enabled: bool,

    #[serde(default)]
    pub promiscuous: bool,
}

/// Link behaviour of the bridge binary
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_dst_addr")]
    pub dst_addr: u16,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// 0 disables beacons
    #[serde(default)]
    pub beacon_interval_ms: u64,

    #[serde(default = "default_beacon_text")]
    pub beacon_text: String,

    #[serde(default = "default_auto_ack")]
    pub auto_ack: bool,

    #[serde(default = "default_ack_response")]
    pub ack_response: String,
}

/// Received frame capture configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_capture_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily rolling log files; empty logs to stdout only
    #[serde(default)]
    pub dir: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_timeout_ms() -> u64 { 500 }

fn default_channel() -> u8 { 36 }
fn default_pan_id() -> u16 { 0xABCD }
fn default_rate() -> DataRate { DataRate::Kbps100 }
fn default_tx_power() -> TxPower { TxPower::Mw20 }
fn default_addr_type() -> u8 { 6 }
fn default_tx_retry() -> u8 { 3 }
fn default_ack_request() -> bool { true }
fn default_broadcast_enabled() -> bool { true }

fn default_dst_addr() -> u16 { 0xFFFF }
fn default_poll_interval_ms() -> u64 { 10 }
fn default_beacon_text() -> String { "subghz-link online".to_string() }
fn default_auto_ack() -> bool { true }
fn default_ack_response() -> String { "ok".to_string() }

fn default_capture_dir() -> String { "./captures".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            pan_id: default_pan_id(),
            rate_kbps: default_rate(),
            tx_power_mw: default_tx_power(),
            addr_type: default_addr_type(),
            tx_retry: default_tx_retry(),
            ack_request: default_ack_request(),
            broadcast_enabled: default_broadcast_enabled(),
            promiscuous: false,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            dst_addr: default_dst_addr(),
            poll_interval_ms: default_poll_interval_ms(),
            beacon_interval_ms: 0,
            beacon_text: default_beacon_text(),
            auto_ack: default_auto_ack(),
            ack_response: default_ack_response(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_capture_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> LinkError {
    LinkError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails (including an unsupported rate or power)
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use subghz_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load `path` if it exists
    ///
    /// Returns `Ok(None)` when there is no file, so the caller can fall back
    /// to defaults and report it once logging is up.
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Serial link to the modem
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![9600, 19200, 38400, 57600, 115200, 230400].contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400"));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        // Radio parameters
        if !(24..=61).contains(&self.radio.channel) {
            return Err(invalid("channel must be between 24 and 61"));
        }

        if self.radio.addr_type > 7 {
            return Err(invalid("addr_type must be between 0 and 7"));
        }

        if self.radio.tx_retry > 15 {
            return Err(invalid("tx_retry must be between 0 and 15"));
        }

        // Link loop timing
        if self.link.poll_interval_ms == 0 || self.link.poll_interval_ms > 60000 {
            return Err(invalid("poll_interval_ms must be between 1 and 60000"));
        }

        if self.link.beacon_interval_ms > 3_600_000 {
            return Err(invalid("beacon_interval_ms must be at most 3600000 (0 disables beacons)"));
        }

        // Capture files
        if self.capture.enabled && self.capture.log_dir.is_empty() {
            return Err(invalid("capture log_dir cannot be empty when enabled"));
        }

        if self.capture.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.capture.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        Ok(())
    }
}
