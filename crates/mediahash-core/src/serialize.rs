//! Hash serialization.
//!
//! Two stable textual forms are produced, both lowercase hex:
//!
//! - cell hashes pack four grid cells per digit, the first cell of each
//!   group being the digit's most significant bit;
//! - word hashes print each 32-bit word as eight digits, in word order
//!   (most significant word first). On the wire each word is little-endian;
//!   the textual form is independent of host byte order.
//!
//! Both forms parse back to exactly the values they were produced from.

use crate::error::{Error, Result};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Pack a 0/1 cell vector into hex. Cell counts are expected to be
/// multiples of four; a trailing partial group packs as if zero-padded.
pub fn bits_to_hex(cells: &[u8]) -> String {
    let mut hex = String::with_capacity(cells.len().div_ceil(4));
    for group in cells.chunks(4) {
        let mut nibble = 0u8;
        for (j, &cell) in group.iter().enumerate() {
            nibble |= (cell & 1) << (3 - j);
        }
        hex.push(HEX_DIGITS[nibble as usize] as char);
    }
    hex
}

/// Parse a hex string back into grid cells, four per digit.
pub fn hex_to_bits(hex: &str) -> Result<Vec<u8>> {
    let mut cells = Vec::with_capacity(hex.len() * 4);
    for c in hex.chars() {
        let nibble = c
            .to_digit(16)
            .ok_or_else(|| Error::InvalidInput(format!("invalid hex digit '{c}'")))?
            as u8;
        for j in (0..4).rev() {
            cells.push((nibble >> j) & 1);
        }
    }
    Ok(cells)
}

/// Format 32-bit words as eight lowercase hex digits each, in order.
pub fn words_to_hex(words: &[u32]) -> String {
    use std::fmt::Write;

    let mut hex = String::with_capacity(words.len() * 8);
    for word in words {
        let _ = write!(hex, "{word:08x}");
    }
    hex
}

/// Parse a hex string back into 32-bit words, eight digits per word.
pub fn hex_to_words(hex: &str) -> Result<Vec<u32>> {
    if hex.len() % 8 != 0 {
        return Err(Error::InvalidInput(format!(
            "word hash hex length must be a multiple of 8, got {}",
            hex.len()
        )));
    }
    hex.as_bytes()
        .chunks_exact(8)
        .map(|chunk| {
            let digits = std::str::from_utf8(chunk)
                .map_err(|_| Error::InvalidInput("invalid hex input".to_string()))?;
            u32::from_str_radix(digits, 16)
                .map_err(|_| Error::InvalidInput(format!("invalid hex word '{digits}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_first_cell_as_most_significant_bit() {
        assert_eq!(bits_to_hex(&[1, 0, 0, 1, 1, 1, 1, 1]), "9f");
        assert_eq!(bits_to_hex(&[0, 0, 0, 0]), "0");
        assert_eq!(bits_to_hex(&[1, 0, 0, 0]), "8");
    }

    #[test]
    fn cell_round_trip() {
        let cells = vec![1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1, 1, 0, 0, 0, 0];
        assert_eq!(hex_to_bits(&bits_to_hex(&cells)).unwrap(), cells);
    }

    #[test]
    fn words_print_most_significant_first() {
        assert_eq!(words_to_hex(&[0xdeadbeef, 0x01234567]), "deadbeef01234567");
        assert_eq!(words_to_hex(&[0, 0]), "0000000000000000");
    }

    #[test]
    fn word_round_trip() {
        let words = vec![0xdeadbeef, 0x01234567, 0, 0xffffffff];
        assert_eq!(hex_to_words(&words_to_hex(&words)).unwrap(), words);
    }

    #[test]
    fn rejects_invalid_hex() {
        assert!(hex_to_bits("0g").is_err());
        assert!(hex_to_words("123").is_err());
        assert!(hex_to_words("0123456z").is_err());
    }
}
