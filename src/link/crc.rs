//! CRC-16/CCITT-FALSE
//!
//! init 0xFFFF, polynomial 0x1021, no reflection, no final XOR. Frames carry
//! the checksum of their four interior bytes big-endian.

use crate::constants::{CRC16_INIT, CRC16_POLY};

/// Calculate the CRC-16/CCITT-FALSE of `data`.
///
/// Any input is valid; the empty slice yields the initial value `0xFFFF`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRC16_INIT;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn test_check_value() {
        // Catalogue check value for CRC-16/CCITT-FALSE
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_frame_payload_vectors() {
        assert_eq!(crc16(&[0x01, 0x01, 0x11, 0x19]), 0x761E);
        assert_eq!(crc16(&[0x02, 0x01, 0x11, 0x37]), 0x286E);
        assert_eq!(crc16(&[0x03, 0x07, 0x11, 0x2A]), 0x2FE6);
    }
}
