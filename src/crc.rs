//! CRC-8 used by the AHT20 to protect the measurement frame.

use crc_any::CRCu8;

/// CRC polynomial, `CRC[7:0] = 1 + x**4 + x**5 + x**8`.
pub const CRC_POLYNOMIAL: u8 = 0x31;
/// CRC initial value.
pub const CRC_INITIAL: u8 = 0xFF;

/// compute_crc uses the CRCu8 algoritm from crc-any. The parameter choice makes this a
/// "CRC-8-Dallas/Maxim" style checksum, MSB-first, with no reflection and no final XOR.
///
/// The CRC invocation takes some parameters, which we get from the datasheet:
/// https://cdn-learn.adafruit.com/assets/assets/000/091/676/original/AHT20-datasheet-2020-4-16.pdf?1591047915
/// Section 5.4.4:
///
/// > CRC initial vaue is 0xFF, crc8 check polynomial CRC[7:0]=1+x**4 + x**5 + x**8
///
/// The most significant bit (x**8) is left out in the hexadecimal representation, which
/// leaves bits 0, 4 and 5 set:
///
/// ```python
/// >>> hex(0b0011_0001)
/// '0x31'
/// ```
///
/// The driver runs this over the six bytes selected by the
/// [`CrcWindow`](crate::CrcWindow) of the active profile.
pub fn compute_crc(bytes: &[u8]) -> u8 {
    // Poly (0x31), bits (8), initial (0xff), final_xor (0x00), reflect (false).
    let mut crc = CRCu8::create_crc(CRC_POLYNOMIAL, 8, CRC_INITIAL, 0x00, false);
    crc.digest(bytes);
    crc.get_crc()
}

#[cfg(test)]
mod tests {
    use super::compute_crc;

    /// Bit-at-a-time reference, used to cross-check the table-driven crc-any result.
    fn reference_crc(bytes: &[u8]) -> u8 {
        let mut crc: u8 = 0xFF;
        for byte in bytes {
            crc ^= byte;
            for _ in 0..8 {
                if crc & 0x80 == 0x80 {
                    crc = (crc << 1) ^ 0x31;
                } else {
                    crc <<= 1;
                }
            }
        }
        crc
    }

    /// Test a valid CRC invocation.
    #[test]
    fn crc_correct() {
        // Sensirion datasheet example, same CRC parameters.
        assert_eq!(compute_crc(&[0xBE, 0xEF]), 0x92);
    }

    /// Test a CRC call that does not match.
    #[test]
    fn crc_wrong() {
        assert_ne!(compute_crc(&[0xFF, 0xFF]), 0x92);
    }

    /// The example measurement frame from the datasheet, status byte included.
    #[test]
    fn crc_datasheet_frame() {
        let frame = [0x1C, 0x08, 0x00, 0x3F, 0x8C, 0x73];
        assert_eq!(compute_crc(&frame), 0x36);
        assert_eq!(compute_crc(&frame), reference_crc(&frame));
    }

    /// A frame captured from a real sensor at ~22.5C and ~40%RH.
    #[test]
    fn crc_captured_frame() {
        let frame = [0x1C, 0x65, 0xB4, 0x25, 0xCD, 0x26];
        assert_eq!(compute_crc(&frame), 0xC6);
    }

    /// Appending the checksum to the data always yields a zero remainder.
    #[test]
    fn crc_residue_is_zero() {
        assert_eq!(compute_crc(&[0x1C, 0x65, 0xB4, 0x25, 0xCD, 0x26, 0xC6]), 0x00);
        assert_eq!(compute_crc(&[0xBE, 0xEF, 0x92]), 0x00);
    }

    #[test]
    fn crc_empty_is_initial_value() {
        assert_eq!(compute_crc(&[]), 0xFF);
    }
}
