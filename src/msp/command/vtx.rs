//! VTX configuration and VTX table commands.

use bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, warn};

use super::*;

/// Values up to this encode band and channel as `(band - 1) << 3 | (channel - 1)`
const BAND_CHANNEL_ENCODED_MAX: u16 = 0x3F;

/// Values above this are neither encoded band/channel nor a frequency
const MAX_FREQUENCY_MHZ: u16 = 5999;

/// Reports the current VTX configuration
#[derive(Debug, Default)]
pub struct VtxConfigCommand;

impl MspCommand for VtxConfigCommand {
    fn id(&self) -> u8 {
        MSP_VTX_CONFIG
    }

    fn handle_request(
        &self,
        ctx: &mut CommandContext,
        _request: &mut &[u8],
        response: &mut BytesMut,
    ) -> Result<(), CommandError> {
        let c = &ctx.vtx;

        response.put_u8(c.device_type);
        response.put_u8(c.band);
        response.put_u8(c.channel);
        response.put_u8(c.power);
        response.put_u8(c.pit_mode as u8);
        response.put_u16_le(c.freq);
        response.put_u8(c.ready as u8);
        response.put_u8(c.low_power_disarm);
        response.put_u16_le(c.pit_mode_freq);
        response.put_u8(c.use_vtx_table as u8);
        response.put_u8(c.table.band_count());
        response.put_u8(c.table.channel_count());
        response.put_u8(c.table.level_count());

        Ok(())
    }
}

/// Updates the VTX configuration
///
/// The request has grown over successive API versions, so clients send
/// anything from just the frequency up to the full structure.
#[derive(Debug, Default)]
pub struct SetVtxConfigCommand;

impl MspCommand for SetVtxConfigCommand {
    fn id(&self) -> u8 {
        MSP_SET_VTX_CONFIG
    }

    fn handle_request(
        &self,
        ctx: &mut CommandContext,
        request: &mut &[u8],
        _response: &mut BytesMut,
    ) -> Result<(), CommandError> {
        let c = &mut ctx.vtx;

        if request.remaining() < 2 {
            debug!("SET_VTX_CONFIG without frequency, nothing to do");
            return Ok(());
        }

        let value = request.get_u16_le();

        if value <= BAND_CHANNEL_ENCODED_MAX {
            let band = (value >> 3) as u8 + 1;
            let channel = (value & 0x07) as u8 + 1;
            if let Err(e) = c.set_frequency(band, channel, 0) {
                warn!("Ignoring encoded frequency {:#04x}: {}", value, e);
            }
        } else if value <= MAX_FREQUENCY_MHZ {
            if let Err(e) = c.set_frequency(0, 0, value) {
                warn!("Ignoring frequency {}: {}", value, e);
            }
        } else {
            warn!("Ignoring out of range frequency {}", value);
        }

        if request.remaining() < 2 {
            return Ok(());
        }

        c.power = request.get_u8();
        c.pit_mode = request.get_u8() != 0;

        if !request.has_remaining() {
            return Ok(());
        }

        c.low_power_disarm = request.get_u8();

        if request.remaining() < 2 {
            return Ok(());
        }

        c.pit_mode_freq = request.get_u16_le();

        if request.remaining() < 4 {
            return Ok(());
        }

        // Unencoded band, channel and frequency override the values set above
        let band = request.get_u8();
        let channel = request.get_u8();
        let freq = request.get_u16_le();
        if let Err(e) = c.set_frequency(band, channel, freq) {
            warn!("Ignoring frequency override: {}", e);
        }

        if request.remaining() < 4 {
            return Ok(());
        }

        let band_count = request.get_u8();
        let channel_count = request.get_u8();
        let level_count = request.get_u8();
        let clear_table = request.get_u8() == 0;

        warn!(
            "Ignoring table resize values - bands={}, channels={}, levels={}, clear={}",
            band_count, channel_count, level_count, clear_table
        );

        if request.has_remaining() {
            debug!("Ignoring {} trailing SET_VTX_CONFIG bytes", request.remaining());
        }

        Ok(())
    }
}

/// Describes one band of the VTX table
#[derive(Debug, Default)]
pub struct VtxTableBandCommand;

impl MspCommand for VtxTableBandCommand {
    fn id(&self) -> u8 {
        MSP_VTXTABLE_BAND
    }

    fn handle_request(
        &self,
        ctx: &mut CommandContext,
        request: &mut &[u8],
        response: &mut BytesMut,
    ) -> Result<(), CommandError> {
        if !request.has_remaining() {
            return Err(CommandError::MissingField("band index"));
        }

        let index = request.get_u8();
        let band = ctx
            .vtx
            .table
            .band(index)
            .ok_or(CommandError::UnknownBand(index))?;

        response.put_u8(index);
        write_with_length(response, band.name.as_bytes());
        response.put_u8(band.letter as u8);
        response.put_u8(band.is_factory_band as u8);
        response.put_u8(band.frequencies.len() as u8);
        for &freq in &band.frequencies {
            response.put_u16_le(freq);
        }

        Ok(())
    }
}

/// Describes one power level of the VTX table
#[derive(Debug, Default)]
pub struct VtxTablePowerLevelCommand;

impl MspCommand for VtxTablePowerLevelCommand {
    fn id(&self) -> u8 {
        MSP_VTXTABLE_POWERLEVEL
    }

    fn handle_request(
        &self,
        ctx: &mut CommandContext,
        request: &mut &[u8],
        response: &mut BytesMut,
    ) -> Result<(), CommandError> {
        if !request.has_remaining() {
            return Err(CommandError::MissingField("power level index"));
        }

        let index = request.get_u8();
        let level = ctx
            .vtx
            .table
            .power_level(index)
            .ok_or(CommandError::UnknownPowerLevel(index))?;

        response.put_u8(index);
        response.put_u16_le(level.value);
        write_with_length(response, level.label.as_bytes());

        Ok(())
    }
}
