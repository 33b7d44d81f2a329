//! # S.Port Protocol Constants and Types
//!
//! Core protocol definitions for S.Port (SmartPort) communication.

use std::fmt;

/// Slot start marker, sent by the receiver before each physical ID
pub const SPORT_START: u8 = 0x7E;

/// Escape byte (called DLE in Betaflight, but not the ASCII DLE value)
pub const SPORT_ESCAPE: u8 = 0x7D;

/// Value XOR'd into an escaped byte
pub const SPORT_ESCAPE_XOR: u8 = 0x20;

/// S.Port baud rate (57,600 baud, 8N1)
pub const SPORT_BAUD_RATE: u32 = 57_600;

/// Frame payload size (bytes following the frame ID)
pub const SPORT_PAYLOAD_SIZE: usize = 6;

/// Logical frame size: frame ID + payload
pub const SPORT_FRAME_SIZE: usize = 1 + SPORT_PAYLOAD_SIZE;

/// Worst case wire size: frame ID + payload + checksum, every byte escaped
pub const SPORT_MAX_WIRE_SIZE: usize = 2 * (SPORT_FRAME_SIZE + 1);

/// Sensor value frame: `{u16 sensor_id, u32 value}`, little-endian
pub const SPORT_FRAMEID_SENSOR: u8 = 0x10;

/// MSP client to server frame
pub const SPORT_FRAMEID_MSP_CLIENT: u8 = 0x30;

/// MSP server to client frame
pub const SPORT_FRAMEID_MSP_SERVER: u8 = 0x32;

/// A single S.Port frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    /// Frame ID (payload type)
    pub id: u8,

    /// Payload data
    pub payload: [u8; SPORT_PAYLOAD_SIZE],
}

impl Frame {
    /// Create a new frame
    pub fn new(id: u8, payload: [u8; SPORT_PAYLOAD_SIZE]) -> Self {
        Self { id, payload }
    }

    /// Create a sensor value frame
    pub fn sensor(sensor_id: u16, value: u32) -> Self {
        let mut payload = [0u8; SPORT_PAYLOAD_SIZE];
        payload[..2].copy_from_slice(&sensor_id.to_le_bytes());
        payload[2..].copy_from_slice(&value.to_le_bytes());
        Self::new(SPORT_FRAMEID_SENSOR, payload)
    }
}

/// Physical ID byte values, indexed by `ID - 1`
///
/// The lower 5 bits are the address and the upper 3 bits are a check.
const PHYSICAL_ID_TABLE: [u8; 27] = [
    0xA1, 0x22, 0x83, 0xE4, 0x45, 0xC6, 0x67, 0x48, 0xE9, 0x6A, 0xCB, 0xAC, 0x0D, 0x8E,
    0x2F, 0xD0, 0x71, 0xF2, 0x53, 0x34, 0x95, 0x16, 0xB7, 0x98, 0x39, 0xBA, 0x1B,
];

const PHYSICAL_ID_MASK: u8 = 0x1F;

/// Bus address of a device on the S.Port line
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalId(u8);

impl PhysicalId {
    /// Default ID used to publish sensor values and MSP responses
    pub const ID27: PhysicalId = PhysicalId(0x1B);

    /// Default ID the flight controller uses for MSP requests
    pub const ID13: PhysicalId = PhysicalId(0x0D);

    /// Look up a physical ID by its number (1 to 27)
    pub fn from_index(index: u8) -> Option<Self> {
        if index == 0 {
            return None;
        }
        PHYSICAL_ID_TABLE
            .get(index as usize - 1)
            .map(|&b| PhysicalId(b))
    }

    /// Interpret a raw bus byte as a physical ID
    ///
    /// Returns `None` if the byte does not carry a valid check.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let index = byte & PHYSICAL_ID_MASK;
        Self::from_index(index).filter(|id| id.0 == byte)
    }

    /// Physical ID number (1 to 27)
    pub fn index(&self) -> u8 {
        self.0 & PHYSICAL_ID_MASK
    }

    /// Raw byte as it appears on the wire
    pub fn as_byte(&self) -> u8 {
        self.0
    }
}

impl fmt::Debug for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID{}(0x{:02X})", self.index(), self.0)
    }
}

impl fmt::Display for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID{}", self.index())
    }
}
