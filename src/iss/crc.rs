//! # CRC-16/CCITT Implementation
//!
//! CRC-16/CCITT checksum used by the ISS transmitter to protect each frame.
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1)
//! **Initial Value**: 0x0000, no reflection, no final XOR
//!
//! The trailer is stored big-endian, so running the CRC over the whole frame
//! (trailer included) leaves a residue of zero for an intact packet.

/// CRC-16/CCITT polynomial
const CRC16_POLY: u16 = 0x1021;

/// Residue expected when the CRC runs over payload and trailer together
pub const CRC16_VALID_RESIDUE: u16 = 0x0000;

/// Precomputed CRC16 lookup table for fast calculation
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate CRC-16/CCITT checksum using lookup table
///
/// # Arguments
///
/// * `data` - Byte slice to calculate CRC for
///
/// # Returns
///
/// * `u16` - Calculated checksum
///
/// # Examples
///
/// ```
/// use iss_weather_link::iss::crc::crc16_ccitt;
///
/// assert_eq!(crc16_ccitt(b"123456789"), 0x31C3);
/// ```
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        let index = ((crc >> 8) as u8 ^ byte) as usize;
        crc = (crc << 8) ^ CRC16_TABLE[index];
    }

    crc
}

/// Bitwise CRC-16/CCITT, used to cross-check the table
#[allow(dead_code)]
fn crc16_ccitt_slow(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc ^= (byte as u16) << 8;

        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
