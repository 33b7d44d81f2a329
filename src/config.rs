//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, SportError};
use crate::sport::protocol::PhysicalId;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub serial: SerialConfig,
    pub sport: SportConfig,
    pub vtx: VtxFilesConfig,
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Written bytes are read back (single-wire S.Port)
    #[serde(default = "default_echo")]
    pub echo: bool,

    #[serde(default = "default_echo_timeout_factor")]
    pub echo_timeout_factor: u32,

    /// Main loop period
    #[serde(default = "default_poll_interval_us")]
    pub poll_interval_us: u64,
}

/// S.Port slot configuration (physical ID numbers, 1 to 27)
#[derive(Debug, Deserialize, Clone)]
pub struct SportConfig {
    #[serde(default = "default_transmit_id")]
    pub transmit_id: u8,

    #[serde(default = "default_receive_id")]
    pub receive_id: u8,
}

/// VTX data files
#[derive(Debug, Deserialize, Clone)]
pub struct VtxFilesConfig {
    /// Saved VTX settings (created by the save-all command)
    #[serde(default = "default_vtx_config_file")]
    pub config_file: String,

    /// Betaflight-format VTX table
    #[serde(default = "default_vtx_table_file")]
    pub table_file: String,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_demo_sensors")]
    pub demo_sensors: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Also write a daily log file here
    #[serde(default)]
    pub directory: Option<String>,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 57600 }
fn default_echo() -> bool { true }
fn default_echo_timeout_factor() -> u32 { 4 }
fn default_poll_interval_us() -> u64 { 500 }

fn default_transmit_id() -> u8 { 27 }
fn default_receive_id() -> u8 { 13 }

fn default_vtx_config_file() -> String { "vtx_config.json".to_string() }
fn default_vtx_table_file() -> String { "config/vtx_table.json".to_string() }

fn default_demo_sensors() -> bool { true }

impl SportConfig {
    /// Physical ID of the transmit slot
    ///
    /// # Errors
    ///
    /// Returns error if `transmit_id` is not between 1 and 27
    pub fn transmit_physical_id(&self) -> Result<PhysicalId> {
        physical_id("transmit_id", self.transmit_id)
    }

    /// Physical ID of the receive slot
    ///
    /// # Errors
    ///
    /// Returns error if `receive_id` is not between 1 and 27
    pub fn receive_physical_id(&self) -> Result<PhysicalId> {
        physical_id("receive_id", self.receive_id)
    }
}

fn physical_id(name: &str, index: u8) -> Result<PhysicalId> {
    PhysicalId::from_index(index).ok_or_else(|| {
        SportError::Config(toml::de::Error::custom(format!(
            "{} must be between 1 and 27, got {}",
            name, index
        )))
    })
}

fn invalid(message: &str) -> SportError {
    SportError::Config(toml::de::Error::custom(message))
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
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sport_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 19200, 38400, 57600, 115200"));
        }

        if self.serial.echo_timeout_factor == 0 || self.serial.echo_timeout_factor > 100 {
            return Err(invalid("echo_timeout_factor must be between 1 and 100"));
        }

        if self.serial.poll_interval_us == 0 || self.serial.poll_interval_us > 1_000_000 {
            return Err(invalid("poll_interval_us must be between 1 and 1000000"));
        }

        self.sport.transmit_physical_id()?;
        self.sport.receive_physical_id()?;

        if self.sport.transmit_id == self.sport.receive_id {
            return Err(invalid("transmit_id and receive_id must differ"));
        }

        if self.vtx.config_file.is_empty() {
            return Err(invalid("vtx config_file cannot be empty"));
        }

        if self.vtx.table_file.is_empty() {
            return Err(invalid("vtx table_file cannot be empty"));
        }

        if matches!(&self.logging.directory, Some(dir) if dir.is_empty()) {
            return Err(invalid("logging directory cannot be empty when set"));
        }

        Ok(())
    }
}
