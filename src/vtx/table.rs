//! VTX table: bands, channel frequencies and power levels.
//!
//! The JSON layout matches Betaflight's `vtxtable` export:
//!
//! ```json
//! {"vtx_table": {"bands_list": [...], "powerlevels_list": [...]}}
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;

/// A band of channel frequencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtxBand {
    pub name: String,
    pub letter: char,
    pub is_factory_band: bool,
    pub frequencies: Vec<u16>,
}

/// A selectable output power
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtxPowerLevel {
    pub value: u16,
    pub label: String,
}

#[derive(Deserialize)]
struct VtxTableFile {
    vtx_table: VtxTableData,
}

#[derive(Deserialize)]
struct VtxTableData {
    bands_list: Vec<VtxBand>,
    #[serde(rename = "powerlevels_list")]
    power_levels: Vec<VtxPowerLevel>,
}

/// Band and power level lookup table
///
/// All lookups take 1-based indexes, as used on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VtxTable {
    bands: Vec<VtxBand>,
    power_levels: Vec<VtxPowerLevel>,
}

impl VtxTable {
    /// Create a table from bands and power levels
    pub fn new(bands: Vec<VtxBand>, power_levels: Vec<VtxPowerLevel>) -> Self {
        Self { bands, power_levels }
    }

    /// Load a table from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid table
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let table = Self::from_json(&contents)?;
        info!(
            "Loaded VTX table from {}: {} bands, {} power levels",
            path.as_ref().display(),
            table.band_count(),
            table.level_count()
        );
        Ok(table)
    }

    /// Parse a table from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let file: VtxTableFile = serde_json::from_str(json)?;
        Ok(Self::new(file.vtx_table.bands_list, file.vtx_table.power_levels))
    }

    /// Band by 1-based index
    pub fn band(&self, index: u8) -> Option<&VtxBand> {
        (index as usize).checked_sub(1).and_then(|i| self.bands.get(i))
    }

    /// Power level by 1-based index
    pub fn power_level(&self, index: u8) -> Option<&VtxPowerLevel> {
        (index as usize)
            .checked_sub(1)
            .and_then(|i| self.power_levels.get(i))
    }

    /// Frequency of a 1-based band and channel
    pub fn get_freq(&self, band: u8, channel: u8) -> Option<u16> {
        let band = self.band(band)?;
        (channel as usize)
            .checked_sub(1)
            .and_then(|i| band.frequencies.get(i))
            .copied()
    }

    pub fn band_count(&self) -> u8 {
        self.bands.len() as u8
    }

    /// Channels in the widest band
    pub fn channel_count(&self) -> u8 {
        self.bands
            .iter()
            .map(|band| band.frequencies.len())
            .max()
            .unwrap_or(0) as u8
    }

    pub fn level_count(&self) -> u8 {
        self.power_levels.len() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TABLE_JSON: &str = r#"{
        "vtx_table": {
            "bands_list": [
                {"name": "BOSCAM_A", "letter": "A", "is_factory_band": true,
                 "frequencies": [5865, 5845, 5825, 5805, 5785, 5765, 5745, 5725]},
                {"name": "FATSHARK", "letter": "F", "is_factory_band": true,
                 "frequencies": [5740, 5760, 5780]}
            ],
            "powerlevels_list": [
                {"value": 25, "label": "25 "},
                {"value": 100, "label": "100"}
            ]
        }
    }"#;

    #[test]
    fn test_from_json() {
        let table = VtxTable::from_json(TABLE_JSON).unwrap();
        assert_eq!(table.band_count(), 2);
        assert_eq!(table.channel_count(), 8);
        assert_eq!(table.level_count(), 2);
        assert_eq!(table.band(2).unwrap().letter, 'F');
        assert_eq!(table.power_level(2).unwrap().value, 100);
    }

    #[test]
    fn test_one_based_lookups() {
        let table = VtxTable::from_json(TABLE_JSON).unwrap();
        assert_eq!(table.get_freq(1, 1), Some(5865));
        assert_eq!(table.get_freq(2, 3), Some(5780));
        assert_eq!(table.get_freq(2, 4), None);
        assert_eq!(table.get_freq(0, 1), None);
        assert_eq!(table.get_freq(1, 0), None);
        assert!(table.band(0).is_none());
        assert!(table.band(3).is_none());
        assert!(table.power_level(0).is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TABLE_JSON.as_bytes()).unwrap();
        file.flush().unwrap();

        let table = VtxTable::load(file.path()).unwrap();
        assert_eq!(table.band(1).unwrap().name, "BOSCAM_A");
    }

    #[test]
    fn test_load_shipped_table() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/vtx_table.json");
        let table = VtxTable::load(path).unwrap();
        assert_eq!(table.band_count(), 5);
        assert_eq!(table.get_freq(5, 1), Some(5658));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(VtxTable::from_json(r#"{"bands_list": []}"#).is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = VtxTable::default();
        assert_eq!(table.channel_count(), 0);
        assert_eq!(table.get_freq(1, 1), None);
    }
}
