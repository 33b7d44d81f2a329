//! # MSP Response Fragmenter
//!
//! Splits an MSP response into S.Port frame payloads, one per transmit slot.
//!
//! Unlike requests, the response header carries no version, and the command
//! ID is never sent explicitly; it is only folded into the checksum.

use super::protocol::*;
use bytes::BufMut;
use tracing::{debug, warn};

/// Outcome of writing one fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    /// More fragments follow in later slots
    Continue,

    /// The checksum was written; the response is fully sent
    Complete,
}

/// Fragments the current MSP response across transmit opportunities
#[derive(Debug, Default)]
pub struct MspResponseFragmenter {
    response: MspResponse,
    offset: usize,
    pending: bool,
    sequence: u8,
}

impl MspResponseFragmenter {
    /// Create a fragmenter with nothing to send
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a response still has fragments to send
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Replace the response being sent
    ///
    /// # Returns
    ///
    /// * `bool` - `true` if an unflushed response was discarded
    pub fn set_response(&mut self, response: MspResponse) -> bool {
        let superseded = self.pending;

        if superseded {
            warn!(
                "Discarding unsent response to command {} ({} of {} bytes sent)",
                self.response.command_id,
                self.offset,
                self.response.payload.len()
            );
        }

        self.response = response;
        self.offset = 0;
        self.pending = true;

        superseded
    }

    /// Write the next fragment into a frame payload
    ///
    /// # Arguments
    ///
    /// * `frame_payload` - Frame payload to fill completely (6 bytes on S.Port)
    ///
    /// # Returns
    ///
    /// * `Fragment` - `Complete` once the checksum has been written
    pub fn fragment(&mut self, frame_payload: &mut [u8]) -> Fragment {
        let mut out = &mut frame_payload[..];
        let total_len = self.response.payload.len();
        let response_remaining = total_len - self.offset;

        let mut header = self.next_sequence();

        if self.offset == 0 {
            header |= MSP_START_FLAG;
            if self.response.is_error {
                header |= MSP_ERROR_FLAG;
            }
            out.put_u8(header);
            out.put_u8(response_remaining as u8);
        } else {
            out.put_u8(header);
        }

        let frame_remaining = out.remaining_mut();
        let count = frame_remaining.min(response_remaining);

        out.put_slice(&self.response.payload[self.offset..self.offset + count]);
        self.offset += count;

        if response_remaining >= frame_remaining {
            return Fragment::Continue;
        }

        out.put_u8(msp_checksum(self.response.command_id, &self.response.payload));

        // Padding value is arbitrary, zero is easiest to read when debugging
        let padding = out.remaining_mut();
        out.put_bytes(0, padding);

        self.pending = false;
        debug!(
            "MSP response to command {} sent ({} bytes)",
            self.response.command_id, total_len
        );

        Fragment::Complete
    }

    fn next_sequence(&mut self) -> u8 {
        let sequence = self.sequence;
        self.sequence = (self.sequence + 1) & MSP_SEQUENCE_MASK;
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collect every fragment of the current response
    fn drain(fragmenter: &mut MspResponseFragmenter) -> Vec<[u8; 6]> {
        let mut frames = Vec::new();
        loop {
            let mut frame = [0xAAu8; 6];
            let result = fragmenter.fragment(&mut frame);
            frames.push(frame);
            if result == Fragment::Complete {
                return frames;
            }
        }
    }

    #[test]
    fn test_api_version_single_fragment() {
        let mut fragmenter = MspResponseFragmenter::new();
        fragmenter.set_response(MspResponse::new(1, vec![0, 1, 43]));

        let mut frame = [0u8; 6];
        assert_eq!(fragmenter.fragment(&mut frame), Fragment::Complete);
        assert_eq!(frame, [0x10, 0x03, 0x00, 0x01, 0x2B, 0x28]);
        assert!(!fragmenter.is_pending());
    }

    #[test]
    fn test_error_response_flags() {
        let mut fragmenter = MspResponseFragmenter::new();
        fragmenter.set_response(MspResponse::from_error(&MspError::Checksum { command_id: 1 }));

        let frames = drain(&mut fragmenter);
        assert_eq!(frames.len(), 1);
        // 1 ^ 1 ^ 1 = 1, then zero padding
        assert_eq!(frames[0], [0x30, 0x01, 0x01, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_empty_response_zero_padded() {
        let mut fragmenter = MspResponseFragmenter::new();
        fragmenter.set_response(MspResponse::new(250, vec![]));

        let frames = drain(&mut fragmenter);
        assert_eq!(frames, vec![[0x10, 0x00, 250, 0x00, 0x00, 0x00]]);
    }

    #[test]
    fn test_multi_fragment_response() {
        let payload: Vec<u8> = (1..=15).collect();
        let mut fragmenter = MspResponseFragmenter::new();
        fragmenter.set_response(MspResponse::new(88, payload.clone()));

        let frames = drain(&mut fragmenter);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], [0x10, 15, 1, 2, 3, 4]);
        assert_eq!(frames[1], [0x01, 5, 6, 7, 8, 9]);
        assert_eq!(frames[2], [0x02, 10, 11, 12, 13, 14]);
        assert_eq!(frames[3], [0x03, 15, msp_checksum(88, &payload), 0, 0, 0]);
    }

    #[test]
    fn test_reassembled_payload_and_checksum() {
        let payload: Vec<u8> = (1..=15).collect();
        let mut fragmenter = MspResponseFragmenter::new();
        fragmenter.set_response(MspResponse::new(88, payload.clone()));

        let frames = drain(&mut fragmenter);
        let mut stream: Vec<u8> = frames[0][2..].to_vec();
        for frame in &frames[1..] {
            stream.extend_from_slice(&frame[1..]);
        }

        assert_eq!(&stream[..15], &payload[..]);
        assert_eq!(stream[15], msp_checksum(88, &payload));
        assert!(stream[16..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_checksum_alone_when_payload_fills_frame() {
        // 4 payload bytes exactly fill the first fragment
        let mut fragmenter = MspResponseFragmenter::new();
        fragmenter.set_response(MspResponse::new(7, vec![1, 2, 3, 4]));

        let frames = drain(&mut fragmenter);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], [0x10, 4, 1, 2, 3, 4]);
        assert_eq!(frames[1], [0x01, 7 ^ 4 ^ 1 ^ 2 ^ 3 ^ 4, 0, 0, 0, 0]);
    }

    #[test]
    fn test_sequence_shared_across_responses() {
        let mut fragmenter = MspResponseFragmenter::new();

        for expected in 0..20u8 {
            fragmenter.set_response(MspResponse::new(1, vec![0, 1, 43]));
            let mut frame = [0u8; 6];
            fragmenter.fragment(&mut frame);
            assert_eq!(frame[0], MSP_START_FLAG | (expected & MSP_SEQUENCE_MASK));
        }
    }

    #[test]
    fn test_set_response_reports_supersession() {
        let mut fragmenter = MspResponseFragmenter::new();
        assert!(!fragmenter.set_response(MspResponse::new(88, (0..15).collect())));

        let mut frame = [0u8; 6];
        assert_eq!(fragmenter.fragment(&mut frame), Fragment::Continue);

        assert!(fragmenter.set_response(MspResponse::new(1, vec![0, 1, 43])));
        assert_eq!(fragmenter.fragment(&mut frame), Fragment::Complete);
        assert_eq!(&frame[1..], &[0x03, 0x00, 0x01, 0x2B, 0x28]);
    }
}
