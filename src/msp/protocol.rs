//! # MSP Protocol Constants and Types
//!
//! Every MSP frame payload starts with a header byte.
//!
//! ```text
//! request:  vvvsnnnn   v = version (must be 1), s = start, n = sequence
//! response: 00esnnnn   e = error, s = start, n = sequence
//! ```

use thiserror::Error;

/// Start of a new message
pub const MSP_START_FLAG: u8 = 0x10;

/// Error response (outgoing messages only)
pub const MSP_ERROR_FLAG: u8 = 0x20;

/// Version bits (incoming messages only)
pub const MSP_VERSION_MASK: u8 = 0xE0;

/// Shift of the version bits
pub const MSP_VERSION_SHIFT: u8 = 5;

/// Sequence number bits
pub const MSP_SEQUENCE_MASK: u8 = 0x0F;

/// The only supported header version
pub const MSP_VERSION: u8 = 1;

/// Wire error code: unsupported header version
pub const MSP_ERROR_VERSION_MISMATCH: u8 = 0;

/// Wire error code: request checksum mismatch
pub const MSP_ERROR_CHECKSUM: u8 = 1;

/// Wire error code: catch-all for command failures
pub const MSP_ERROR_GENERIC: u8 = 2;

/// A fully reassembled MSP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MspRequest {
    /// Command ID
    pub command_id: u8,

    /// Request payload (declared length bytes)
    pub payload: Vec<u8>,
}

/// An outgoing MSP response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MspResponse {
    /// Command ID, only folded into the checksum on the wire
    pub command_id: u8,

    /// Response payload
    pub payload: Vec<u8>,

    /// Whether this is an error response
    pub is_error: bool,
}

impl MspResponse {
    /// Create a successful response
    pub fn new(command_id: u8, payload: Vec<u8>) -> Self {
        Self {
            command_id,
            payload,
            is_error: false,
        }
    }

    /// Create an error response carrying the wire code of `error`
    pub fn from_error(error: &MspError) -> Self {
        Self {
            command_id: error.command_id(),
            payload: vec![error.code()],
            is_error: true,
        }
    }
}

/// MSP exchange failures that are reported back to the client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MspError {
    /// Header carried an unsupported version
    #[error("unsupported MSP version {version}")]
    VersionMismatch { version: u8 },

    /// Reassembled request failed its checksum
    #[error("checksum mismatch for command {command_id}")]
    Checksum { command_id: u8 },

    /// No handler is registered for the command
    #[error("unknown command {command_id}")]
    UnknownCommand { command_id: u8 },

    /// The handler failed
    #[error("command {command_id} failed: {reason}")]
    Handler { command_id: u8, reason: String },
}

impl MspError {
    /// Error code sent as the payload of the error response
    pub fn code(&self) -> u8 {
        match self {
            MspError::VersionMismatch { .. } => MSP_ERROR_VERSION_MISMATCH,
            MspError::Checksum { .. } => MSP_ERROR_CHECKSUM,
            MspError::UnknownCommand { .. } | MspError::Handler { .. } => MSP_ERROR_GENERIC,
        }
    }

    /// Command the error relates to (0 when the header could not be read)
    pub fn command_id(&self) -> u8 {
        match self {
            MspError::VersionMismatch { .. } => 0,
            MspError::Checksum { command_id }
            | MspError::UnknownCommand { command_id }
            | MspError::Handler { command_id, .. } => *command_id,
        }
    }
}

/// XOR checksum over declared length, command ID and payload
///
/// Used by both requests and responses.
pub fn msp_checksum(command_id: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(payload.len() as u8 ^ command_id, |acc, &b| acc ^ b)
}
