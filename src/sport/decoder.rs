//! # S.Port Frame Decoder
//!
//! Decodes escaped wire bytes into frames, one byte at a time.

use super::checksum;
use super::protocol::*;
use tracing::{error, trace};

/// Outcome of feeding one byte to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// More bytes are needed to complete the frame
    NeedMore,

    /// A complete frame with a valid checksum
    Frame(Frame),

    /// A complete frame whose checksum did not match
    Invalid,
}

/// Byte-by-byte S.Port frame decoder
///
/// Holds a single frame buffer that is reused for every frame on the line.
/// The owner must call [`FrameDecoder::reset`] whenever a new slot starts.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: [u8; SPORT_FRAME_SIZE],
    offset: usize,
    total: u16,
    escaping: bool,
}

impl FrameDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard any partially decoded frame
    pub fn reset(&mut self) {
        self.offset = 0;
        self.total = 0;
        self.escaping = false;
    }

    /// Feed one wire byte to the decoder
    ///
    /// # Arguments
    ///
    /// * `byte` - Next byte received within the current slot
    ///
    /// # Returns
    ///
    /// * `DecodeStatus` - `NeedMore` until the checksum byte arrives, then
    ///   `Frame` or `Invalid`. The decoder is reset after either outcome.
    pub fn consume(&mut self, byte: u8) -> DecodeStatus {
        let b = if byte == SPORT_ESCAPE {
            self.escaping = true;
            return DecodeStatus::NeedMore;
        } else if self.escaping {
            self.escaping = false;
            byte ^ SPORT_ESCAPE_XOR
        } else {
            byte
        };

        self.total = self.total.wrapping_add(b as u16);

        if self.offset < SPORT_FRAME_SIZE {
            self.buffer[self.offset] = b;
            self.offset += 1;
            return DecodeStatus::NeedMore;
        }

        // This byte was the checksum
        let valid = checksum::validate(self.total);
        let frame = self.current_frame();
        self.reset();

        if valid {
            trace!("Decoded frame 0x{:02X} {:02X?}", frame.id, frame.payload);
            DecodeStatus::Frame(frame)
        } else {
            error!("Invalid frame checksum (frame ID 0x{:02X})", frame.id);
            DecodeStatus::Invalid
        }
    }

    fn current_frame(&self) -> Frame {
        let mut payload = [0u8; SPORT_PAYLOAD_SIZE];
        payload.copy_from_slice(&self.buffer[1..]);
        Frame::new(self.buffer[0], payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sport::encoder::encode_frame;

    fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<DecodeStatus> {
        bytes.iter().map(|&b| decoder.consume(b)).collect()
    }

    #[test]
    fn test_decode_round_trip() {
        let frames = [
            Frame::sensor(0x0400, 12345),
            Frame::new(SPORT_FRAMEID_MSP_CLIENT, [0x30, 0x00, 0x01, 0x01, 0x00, 0x00]),
            Frame::new(SPORT_START, [SPORT_ESCAPE, SPORT_START, 0x5D, 0x5E, 0x00, 0xFF]),
            Frame::new(SPORT_ESCAPE, [SPORT_START; 6]),
            Frame::new(0x81, [0x00; 6]), // checksum byte is 0x7E
            Frame::new(0x00, [0x00; 6]),
            Frame::new(0xFF, [0xFF; 6]),
        ];

        for frame in frames.iter() {
            let mut decoder = FrameDecoder::new();
            let statuses = decode_all(&mut decoder, &encode_frame(frame));

            let (last, rest) = statuses.split_last().unwrap();
            assert!(rest.iter().all(|s| *s == DecodeStatus::NeedMore));
            assert_eq!(*last, DecodeStatus::Frame(*frame), "round trip failed for {:?}", frame);
        }
    }

    #[test]
    fn test_decode_bad_checksum_is_invalid() {
        let mut bytes = encode_frame(&Frame::sensor(0x0400, 1));
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let mut decoder = FrameDecoder::new();
        let statuses = decode_all(&mut decoder, &bytes);
        assert_eq!(statuses[last], DecodeStatus::Invalid);
    }

    #[test]
    fn test_decode_incomplete_needs_more() {
        let bytes = encode_frame(&Frame::sensor(0x0400, 1));

        let mut decoder = FrameDecoder::new();
        let statuses = decode_all(&mut decoder, &bytes[..bytes.len() - 1]);
        assert!(statuses.iter().all(|s| *s == DecodeStatus::NeedMore));
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let partial = encode_frame(&Frame::sensor(0x0410, 99));
        let full = encode_frame(&Frame::sensor(0x0400, 1));

        let mut decoder = FrameDecoder::new();
        decode_all(&mut decoder, &partial[..4]);
        decoder.reset();

        let statuses = decode_all(&mut decoder, &full);
        assert_eq!(*statuses.last().unwrap(), DecodeStatus::Frame(Frame::sensor(0x0400, 1)));
    }

    #[test]
    fn test_reset_clears_pending_escape() {
        let full = encode_frame(&Frame::sensor(0x0400, 1));

        let mut decoder = FrameDecoder::new();
        decoder.consume(SPORT_ESCAPE);
        decoder.reset();

        let statuses = decode_all(&mut decoder, &full);
        assert_eq!(*statuses.last().unwrap(), DecodeStatus::Frame(Frame::sensor(0x0400, 1)));
    }

    #[test]
    fn test_decoder_ready_after_frame() {
        let first = encode_frame(&Frame::sensor(0x0400, 1));
        let second = encode_frame(&Frame::sensor(0x0400, 2));

        let mut decoder = FrameDecoder::new();
        decode_all(&mut decoder, &first);
        let statuses = decode_all(&mut decoder, &second);
        assert_eq!(*statuses.last().unwrap(), DecodeStatus::Frame(Frame::sensor(0x0400, 2)));
    }
}
