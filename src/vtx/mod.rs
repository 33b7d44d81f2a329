//! # VTX Configuration
//!
//! Video transmitter state that MSP commands read and modify.
//!
//! This module handles:
//! - The VTX table (bands, channels, power levels) loaded from JSON
//! - The current VTX settings and frequency selection
//! - Persisting settings through a replaceable [`ConfigStore`]

pub mod table;

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::Result;
pub use table::{VtxBand, VtxPowerLevel, VtxTable};

/// SmartAudio device type, from `vtxDevType_e` in Betaflight
pub const VTX_DEV_SMARTAUDIO: u8 = 3;

/// Errors raised by VTX accessors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VtxError {
    /// Band/channel pair is not in the VTX table
    #[error("band {band} channel {channel} is not in the VTX table")]
    UnknownChannel { band: u8, channel: u8 },
}

/// Persisted subset of the VTX configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VtxSettings {
    pub device_type: u8,
    pub band: u8,
    pub channel: u8,
    pub power: u8,
    pub pit_mode: bool,
    pub pit_mode_freq: u16,
    pub low_power_disarm: u8,
    pub freq: u16,
}

impl Default for VtxSettings {
    fn default() -> Self {
        Self {
            device_type: VTX_DEV_SMARTAUDIO,
            band: 1,
            channel: 1,
            power: 1,
            pit_mode: true,
            pit_mode_freq: 0,
            low_power_disarm: 0,
            freq: 0,
        }
    }
}

/// Somewhere VTX settings can be saved
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore {
    /// Persist the settings
    fn save(&self, settings: &VtxSettings) -> io::Result<()>;
}

/// Stores VTX settings as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load previously saved settings
    ///
    /// # Returns
    ///
    /// * `Result<Option<VtxSettings>>` - `None` if nothing has been saved yet
    pub fn load(&self) -> Result<Option<VtxSettings>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(Some(settings))
    }
}

impl ConfigStore for JsonFileStore {
    fn save(&self, settings: &VtxSettings) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, json)?;
        debug!("Saved VTX settings to {}", self.path.display());
        Ok(())
    }
}

/// Anything the save-all command writes out
pub trait Persist {
    /// Name used in log messages
    fn name(&self) -> &str;

    /// Save current state
    fn save(&self) -> io::Result<()>;
}

/// Live VTX configuration
///
/// `band`, `channel` and `power` index into the table starting from 1
/// (0 means not set).
pub struct VtxConfig {
    pub device_type: u8,
    pub band: u8,
    pub channel: u8,
    pub power: u8,
    pub pit_mode: bool,
    pub pit_mode_freq: u16,
    pub low_power_disarm: u8,
    pub freq: u16,
    pub ready: bool,
    pub use_vtx_table: bool,
    pub table: VtxTable,
    store: Box<dyn ConfigStore>,
}

impl std::fmt::Debug for VtxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VtxConfig")
            .field("band", &self.band)
            .field("channel", &self.channel)
            .field("power", &self.power)
            .field("freq", &self.freq)
            .field("pit_mode", &self.pit_mode)
            .finish_non_exhaustive()
    }
}

impl VtxConfig {
    /// Create a configuration with default settings
    pub fn new(table: VtxTable, store: Box<dyn ConfigStore>) -> Self {
        Self::with_settings(VtxSettings::default(), table, store)
    }

    /// Create a configuration from previously saved settings
    ///
    /// The frequency is recomputed from the table when a band is set.
    pub fn with_settings(settings: VtxSettings, table: VtxTable, store: Box<dyn ConfigStore>) -> Self {
        let mut config = Self {
            device_type: settings.device_type,
            band: settings.band,
            channel: settings.channel,
            power: settings.power,
            pit_mode: settings.pit_mode,
            pit_mode_freq: settings.pit_mode_freq,
            low_power_disarm: settings.low_power_disarm,
            freq: settings.freq,
            ready: true,
            use_vtx_table: true,
            table,
            store,
        };

        if config.band != 0 {
            config.freq = config
                .table
                .get_freq(config.band, config.channel)
                .unwrap_or(settings.freq);
        }

        info!(
            "VTX band {} channel {} at {} MHz (power {})",
            config.band, config.channel, config.freq, config.power
        );

        config
    }

    /// Select the output frequency
    ///
    /// The frequency normally comes from `band` and `channel`. With `band` set
    /// to 0, `freq` is used directly.
    ///
    /// # Errors
    ///
    /// Returns `VtxError::UnknownChannel` if the band/channel pair is not in
    /// the table; the configuration is left unchanged.
    pub fn set_frequency(&mut self, band: u8, channel: u8, freq: u16) -> std::result::Result<(), VtxError> {
        let freq = if band == 0 {
            freq
        } else {
            self.table
                .get_freq(band, channel)
                .ok_or(VtxError::UnknownChannel { band, channel })?
        };

        self.band = band;
        self.channel = channel;
        self.freq = freq;

        debug!("VTX frequency set to {} MHz (band {}, channel {})", freq, band, channel);
        Ok(())
    }

    /// Snapshot of the persisted fields
    pub fn settings(&self) -> VtxSettings {
        VtxSettings {
            device_type: self.device_type,
            band: self.band,
            channel: self.channel,
            power: self.power,
            pit_mode: self.pit_mode,
            pit_mode_freq: self.pit_mode_freq,
            low_power_disarm: self.low_power_disarm,
            freq: self.freq,
        }
    }
}

impl Persist for VtxConfig {
    fn name(&self) -> &str {
        "vtx"
    }

    fn save(&self) -> io::Result<()> {
        self.store.save(&self.settings())
    }
}
