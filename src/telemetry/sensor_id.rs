//! FrSky sensor IDs, as listed in OpenTX's `frsky.h`.
//!
//! Each sensor type owns a range of 16 IDs so several instances of the same
//! sensor can share a bus.

/// Namespace for sensor ID ranges
pub struct SensorId;

impl SensorId {
    pub const ALT_FIRST: u16 = 0x0100;
    pub const ALT_LAST: u16 = 0x010F;
    pub const VARIO_FIRST: u16 = 0x0110;
    pub const VARIO_LAST: u16 = 0x011F;
    pub const CURR_FIRST: u16 = 0x0200;
    pub const CURR_LAST: u16 = 0x020F;
    pub const VFAS_FIRST: u16 = 0x0210;
    pub const VFAS_LAST: u16 = 0x021F;
    pub const CELLS_FIRST: u16 = 0x0300;
    pub const CELLS_LAST: u16 = 0x030F;
    pub const T1_FIRST: u16 = 0x0400;
    pub const T1_LAST: u16 = 0x040F;
    pub const T2_FIRST: u16 = 0x0410;
    pub const T2_LAST: u16 = 0x041F;
    pub const RPM_FIRST: u16 = 0x0500;
    pub const RPM_LAST: u16 = 0x050F;
    pub const FUEL_FIRST: u16 = 0x0600;
    pub const FUEL_LAST: u16 = 0x060F;
    pub const ACCX_FIRST: u16 = 0x0700;
    pub const ACCX_LAST: u16 = 0x070F;
    pub const ACCY_FIRST: u16 = 0x0710;
    pub const ACCY_LAST: u16 = 0x071F;
    pub const ACCZ_FIRST: u16 = 0x0720;
    pub const ACCZ_LAST: u16 = 0x072F;
    pub const GPS_LONG_LATI_FIRST: u16 = 0x0800;
    pub const GPS_LONG_LATI_LAST: u16 = 0x080F;
    pub const GPS_ALT_FIRST: u16 = 0x0820;
    pub const GPS_ALT_LAST: u16 = 0x082F;
    pub const GPS_SPEED_FIRST: u16 = 0x0830;
    pub const GPS_SPEED_LAST: u16 = 0x083F;
    pub const GPS_COURS_FIRST: u16 = 0x0840;
    pub const GPS_COURS_LAST: u16 = 0x084F;
    pub const GPS_TIME_DATE_FIRST: u16 = 0x0850;
    pub const GPS_TIME_DATE_LAST: u16 = 0x085F;
    pub const A3_FIRST: u16 = 0x0900;
    pub const A3_LAST: u16 = 0x090F;
    pub const A4_FIRST: u16 = 0x0910;
    pub const A4_LAST: u16 = 0x091F;
    pub const AIR_SPEED_FIRST: u16 = 0x0A00;
    pub const AIR_SPEED_LAST: u16 = 0x0A0F;
    pub const FUEL_QTY_FIRST: u16 = 0x0A10;
    pub const FUEL_QTY_LAST: u16 = 0x0A1F;
    pub const ESC_POWER_FIRST: u16 = 0x0B50;
    pub const ESC_POWER_LAST: u16 = 0x0B5F;
    pub const ESC_RPM_CONS_FIRST: u16 = 0x0B60;
    pub const ESC_RPM_CONS_LAST: u16 = 0x0B6F;
    pub const ESC_TEMPERATURE_FIRST: u16 = 0x0B70;
    pub const ESC_TEMPERATURE_LAST: u16 = 0x0B7F;

    /// Whether `id` falls within the 16-ID range starting at `first`
    pub fn in_range(id: u16, first: u16) -> bool {
        (first..=first + 0x0F).contains(&id)
    }
}
