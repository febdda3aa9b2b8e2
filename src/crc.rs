//! CRC-16/CCITT-FALSE checksum used by the payload's terminal `63` field.
//!
//! Polynomial `0x1021`, initial register `0xFFFF`, MSB-first, no reflection and
//! no final XOR. The `crc` catalogue lists this variant as CRC-16/IBM-3740.

use crc::{Crc, CRC_16_IBM_3740};

const CCITT_FALSE: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Number of hex characters in a rendered checksum.
pub const CHECKSUM_LEN: usize = 4;

/// Computes the raw 16-bit checksum of `input`.
pub fn crc16(input: &str) -> u16 {
    CCITT_FALSE.checksum(input.as_bytes())
}

/// Computes the checksum of `input` rendered as 4 uppercase hex digits.
///
/// ```
/// assert_eq!(qris_engine::crc::checksum("123456789"), "29B1");
/// ```
pub fn checksum(input: &str) -> String {
    format!("{:04X}", crc16(input))
}

/// Returns `true` if the last 4 characters of `payload` are the checksum of
/// everything before them.
///
/// Hex digits are compared case-insensitively; a payload too short to carry a
/// checksum never verifies.
pub fn verify(payload: &str) -> bool {
    if payload.len() < CHECKSUM_LEN || !payload.is_char_boundary(payload.len() - CHECKSUM_LEN) {
        return false;
    }

    let (body, expected) = payload.split_at(payload.len() - CHECKSUM_LEN);
    checksum(body).eq_ignore_ascii_case(expected)
}
