//! # S.Port Frame Checksum
//!
//! Additive checksum with carry folding, as used by FrSky S.Port frames.
//!
//! The sender sums the 7 unescaped logical bytes (frame ID + payload), folds
//! the carry back into the low byte until the total fits in 8 bits and sends
//! `0xFF - folded`. The receiver sums all 8 bytes; a valid frame folds to `0xFF`.

/// Fold the high byte of a running total into the low byte until it fits in 8 bits
///
/// # Arguments
///
/// * `total` - Running additive total of frame bytes
///
/// # Returns
///
/// * `u8` - Folded total
///
/// # Examples
///
/// ```
/// use sport_telemetry::sport::checksum::fold;
///
/// assert_eq!(fold(0x01FF), 0x01);
/// assert_eq!(fold(fold(0x0321) as u16), fold(0x0321));
/// ```
pub fn fold(total: u16) -> u8 {
    let mut folded = total;

    while folded > 0xFF {
        folded = (folded >> 8) + (folded & 0xFF);
    }

    folded as u8
}

/// Calculate the checksum byte for a frame
///
/// # Arguments
///
/// * `data` - Unescaped frame ID and payload bytes
///
/// # Returns
///
/// * `u8` - Checksum byte to append
pub fn calculate(data: &[u8]) -> u8 {
    0xFF - fold(sum(data))
}

/// Validate a running total that includes the received checksum byte
pub fn validate(total: u16) -> bool {
    fold(total) == 0xFF
}

/// Sum bytes into a 16-bit running total
pub fn sum(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_small_values_unchanged() {
        assert_eq!(fold(0x00), 0x00);
        assert_eq!(fold(0x7E), 0x7E);
        assert_eq!(fold(0xFF), 0xFF);
    }

    #[test]
    fn test_fold_carries() {
        assert_eq!(fold(0x0100), 0x01);
        assert_eq!(fold(0x01FF), 0x01); // 0x01 + 0xFF = 0x100 -> 0x01
        assert_eq!(fold(0x06F9), 0xFF);
    }

    #[test]
    fn test_fold_is_idempotent() {
        for total in [0u16, 0x7D, 0xFF, 0x100, 0x1FE, 0x2A5, 0x7F8, 0xFFFF] {
            let once = fold(total);
            assert_eq!(fold(once as u16), once, "fold not idempotent for 0x{:04X}", total);
        }
    }

    #[test]
    fn test_calculate_validates() {
        let frames = [
            [0x10u8, 0x00, 0x04, 0xA0, 0x86, 0x01, 0x00],
            [0x32, 0x10, 0x03, 0x00, 0x01, 0x2B, 0x28],
            [0x00; 7],
            [0xFF; 7],
            [0x7E, 0x7D, 0x7E, 0x7D, 0x7E, 0x7D, 0x7E],
        ];

        for data in frames.iter() {
            let checksum = calculate(data);
            let total = sum(data) + checksum as u16;
            assert!(validate(total), "checksum 0x{:02X} invalid for {:02X?}", checksum, data);
        }
    }

    #[test]
    fn test_all_zero_frame_checksum() {
        assert_eq!(calculate(&[0x00; 7]), 0xFF);
    }

    #[test]
    fn test_corrupted_total_fails() {
        let data = [0x10u8, 0x00, 0x04, 0x01, 0x00, 0x00, 0x00];
        let checksum = calculate(&data);
        let total = sum(&data) + checksum as u16 + 1;
        assert!(!validate(total));
    }
}
