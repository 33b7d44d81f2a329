//! # S.Port Frame Encoder
//!
//! Encodes frames into escaped wire bytes.

use super::checksum;
use super::protocol::*;

/// Encode a frame into wire bytes
///
/// # Arguments
///
/// * `frame` - Frame to encode
///
/// # Returns
///
/// * `Vec<u8>` - Escaped frame ID, payload and checksum (8 to 16 bytes)
///
/// # Examples
///
/// ```
/// use sport_telemetry::sport::encoder::encode_frame;
/// use sport_telemetry::sport::protocol::Frame;
///
/// let bytes = encode_frame(&Frame::sensor(0x0400, 1));
/// assert_eq!(bytes.len(), 8);
/// ```
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::with_capacity(SPORT_MAX_WIRE_SIZE);
    encode_frame_into(frame, &mut out);
    out
}

/// Encode a frame into an existing buffer
///
/// The buffer is cleared first so a bus line can reuse one allocation.
pub fn encode_frame_into(frame: &Frame, out: &mut Vec<u8>) {
    out.clear();

    let mut logical = [0u8; SPORT_FRAME_SIZE];
    logical[0] = frame.id;
    logical[1..].copy_from_slice(&frame.payload);

    for &b in logical.iter() {
        push_escaped(out, b);
    }

    push_escaped(out, checksum::calculate(&logical));
}

/// Append a byte, escaping it if it collides with a control code
fn push_escaped(out: &mut Vec<u8>, b: u8) {
    if b == SPORT_START || b == SPORT_ESCAPE {
        out.push(SPORT_ESCAPE);
        out.push(b ^ SPORT_ESCAPE_XOR);
    } else {
        out.push(b);
    }
}
