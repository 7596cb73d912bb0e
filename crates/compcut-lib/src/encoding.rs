//! DNA nucleotide encoding
//!
//! 2-bit encoding used for every k-mer code in this crate:
//! - A (65/97)  -> 00
//! - C (67/99)  -> 01
//! - G (71/103) -> 10
//! - T (84/116) -> 11
//!
//! With this layout the complement of a base is `3 - bits`.

use thiserror::Error;

/// Error type for encoding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The input byte is not a valid DNA base (A/C/G/T)
    #[error("Invalid DNA base: {0:?}")]
    InvalidBase(u8),
    /// The requested k does not fit into a 64-bit code
    #[error("Unsupported k-mer length {0} (expected 1..=31)")]
    UnsupportedK(usize),
}

/// Nucleotides in code order
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Encode a single DNA nucleotide to 2 bits
#[inline]
pub const fn encode_base(base: u8) -> Result<u8, EncodingError> {
    match base {
        b'A' | b'a' => Ok(0b00),
        b'C' | b'c' => Ok(0b01),
        b'G' | b'g' => Ok(0b10),
        b'T' | b't' => Ok(0b11),
        _ => Err(EncodingError::InvalidBase(base)),
    }
}

/// Encode a single nucleotide, `None` for ambiguous bases
#[inline]
pub const fn try_encode_base(base: u8) -> Option<u8> {
    match encode_base(base) {
        Ok(bits) => Some(bits),
        Err(_) => None,
    }
}

/// Decode a 2-bit value to DNA nucleotide (uppercase)
#[inline]
pub const fn decode_base(bits: u8) -> u8 {
    BASES[(bits & 0b11) as usize]
}

/// Get the complement of a DNA base (encoded)
#[inline]
pub const fn complement_base(bits: u8) -> u8 {
    3 - (bits & 0b11)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_base() {
        assert_eq!(encode_base(b'A').unwrap(), 0b00);
        assert_eq!(encode_base(b'a').unwrap(), 0b00);
        assert_eq!(encode_base(b'C').unwrap(), 0b01);
        assert_eq!(encode_base(b'g').unwrap(), 0b10);
        assert_eq!(encode_base(b'T').unwrap(), 0b11);

        assert!(encode_base(b'N').is_err());
        assert!(encode_base(b'-').is_err());
        assert_eq!(try_encode_base(b'N'), None);
    }

    #[test]
    fn test_decode_base() {
        for (bits, &base) in BASES.iter().enumerate() {
            assert_eq!(decode_base(bits as u8), base);
        }
    }

    #[test]
    fn test_complement_base() {
        assert_eq!(complement_base(0b00), 0b11); // A -> T
        assert_eq!(complement_base(0b11), 0b00); // T -> A
        assert_eq!(complement_base(0b01), 0b10); // C -> G
        assert_eq!(complement_base(0b10), 0b01); // G -> C
    }
}
