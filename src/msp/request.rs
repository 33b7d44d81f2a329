//! # MSP Request Reassembler
//!
//! Rebuilds an MSP request from a sequence of S.Port frame payloads.
//!
//! * A start frame is `[header][length][command][payload...]`.
//! * A continuation frame is `[header][payload...]`.
//! * Once `length` payload bytes have been gathered, the next byte is the checksum.
//!
//! A short request fits in one frame, e.g. API_VERSION:
//!
//! ```text
//! 0x30 0x00 0x01 0x01
//! hdr  len  cmd  checksum
//! ```

use super::protocol::*;
use crate::sport::protocol::SPORT_PAYLOAD_SIZE;
use bytes::Buf;
use tracing::{debug, error, warn};

/// Largest request payload the length byte can declare
const MAX_REQUEST_SIZE: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReassemblyState {
    Idle,
    Accumulating,
}

/// Reassembles MSP requests across frames
#[derive(Debug)]
pub struct MspRequestReassembler {
    state: ReassemblyState,
    command_id: u8,
    declared_len: usize,
    last_sequence: u8,
    buffer: Vec<u8>,
}

impl MspRequestReassembler {
    /// Create an idle reassembler
    pub fn new() -> Self {
        Self {
            state: ReassemblyState::Idle,
            command_id: 0,
            declared_len: 0,
            last_sequence: 0,
            buffer: Vec::with_capacity(MAX_REQUEST_SIZE),
        }
    }

    /// Whether a request is partially gathered
    pub fn is_accumulating(&self) -> bool {
        self.state == ReassemblyState::Accumulating
    }

    /// Consume one frame payload
    ///
    /// # Arguments
    ///
    /// * `payload` - The 6 payload bytes of an MSP client frame
    ///
    /// # Returns
    ///
    /// * `Ok(Some(request))` - The request is complete and its checksum matched
    /// * `Ok(None)` - More frames are needed, or the frame was dropped
    ///
    /// # Errors
    ///
    /// * `MspError::VersionMismatch` - Header version is not 1 (state unchanged)
    /// * `MspError::Checksum` - Request complete but checksum mismatched
    pub fn consume(
        &mut self,
        payload: &[u8; SPORT_PAYLOAD_SIZE],
    ) -> Result<Option<MspRequest>, MspError> {
        let mut frame = &payload[..];

        let header = frame.get_u8();
        let version = (header & MSP_VERSION_MASK) >> MSP_VERSION_SHIFT;

        if version != MSP_VERSION {
            return Err(MspError::VersionMismatch { version });
        }

        let sequence = header & MSP_SEQUENCE_MASK;

        if header & MSP_START_FLAG != 0 {
            self.declared_len = frame.get_u8() as usize;
            self.command_id = frame.get_u8();
            self.buffer.clear();
            self.state = ReassemblyState::Accumulating;
        } else if self.state == ReassemblyState::Idle {
            warn!("Ignoring MSP continuation without start frame: {:02X?}", payload);
            return Ok(None);
        } else if sequence != (self.last_sequence + 1) & MSP_SEQUENCE_MASK {
            error!(
                "MSP packet loss between sequence {} and {}",
                self.last_sequence, sequence
            );
            self.state = ReassemblyState::Idle;
            return Ok(None);
        }

        self.last_sequence = sequence;

        let request_remaining = self.declared_len - self.buffer.len();
        let count = frame.remaining().min(request_remaining);
        self.buffer.extend_from_slice(&frame[..count]);
        frame.advance(count);

        // Either the frame was used up and more are needed, or the next byte is the checksum
        if !frame.has_remaining() {
            return Ok(None);
        }

        self.state = ReassemblyState::Idle;

        let expected = msp_checksum(self.command_id, &self.buffer);
        if expected != frame.get_u8() {
            return Err(MspError::Checksum {
                command_id: self.command_id,
            });
        }

        debug!(
            "MSP request complete: command {}, {} bytes",
            self.command_id,
            self.buffer.len()
        );

        Ok(Some(MspRequest {
            command_id: self.command_id,
            payload: self.buffer.clone(),
        }))
    }
}

impl Default for MspRequestReassembler {
    fn default() -> Self {
        Self::new()
    }
}
