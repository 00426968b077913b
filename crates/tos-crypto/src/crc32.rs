//! Table-driven CRC32.
//!
//! The table is generated at compile time from the reflected polynomial.
//! [`checksum`] uses the conventional `0xFFFFFFFF` seed and final inversion,
//! which makes it interchangeable with the CRC stored in zip-style
//! directories. [`update_byte`] is the raw step without seeding; the
//! [`pkware`](crate::pkware) key schedule folds its key words through it
//! directly.
//!
//! # Examples
//!
//! ```
//! use tos_crypto::crc32;
//!
//! assert_eq!(crc32::checksum(b""), 0);
//! assert_eq!(crc32::checksum(b"123456789"), 0xCBF4_3926);
//!
//! let mut state = 0xFFFF_FFFF;
//! for &byte in b"123456789" {
//!     state = crc32::update_byte(state, byte);
//! }
//! assert_eq!(!state, 0xCBF4_3926);
//! ```

/// Reflected CRC-32 polynomial.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Lookup table, one entry per byte value.
pub static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut index = 0;
    while index < 256 {
        let mut value = index as u32;
        let mut bit = 0;
        while bit < 8 {
            value = if value & 1 == 1 {
                (value >> 1) ^ POLYNOMIAL
            } else {
                value >> 1
            };
            bit += 1;
        }
        table[index] = value;
        index += 1;
    }
    table
}

/// Fold one byte into a CRC state.
#[inline]
pub const fn update_byte(state: u32, byte: u8) -> u32 {
    TABLE[((state ^ byte as u32) & 0xFF) as usize] ^ (state >> 8)
}

/// CRC32 of a whole buffer.
pub fn checksum(data: &[u8]) -> u32 {
    !data
        .iter()
        .fold(0xFFFF_FFFF, |state, &byte| update_byte(state, byte))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_table_entries() {
        assert_eq!(TABLE[0], 0);
        assert_eq!(TABLE[1], 0x7707_3096);
        assert_eq!(TABLE[255], 0x2D02_EF8D);
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(checksum(b""), 0x0000_0000);
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
        assert_eq!(checksum(b"hello world"), 0x0D4A_1185);
    }

    #[test]
    fn test_update_byte_matches_checksum() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut state = 0xFFFF_FFFF;
        for &byte in data {
            state = update_byte(state, byte);
        }
        assert_eq!(!state, checksum(data));
    }

    #[test]
    fn test_matches_reference_implementation() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert_eq!(checksum(&data), crc32fast::hash(&data));
    }
}
