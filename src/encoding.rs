//! Packing of strings and verification codes into BN254 scalar field values.
//!
//! A string is split into Unicode scalar values; every 7 of them fill one field
//! element, each written as a little-endian `u32` at increasing byte offsets of a
//! little-endian 32-byte buffer. 7 * 4 = 28 bytes keeps every element far below
//! the modulus, so the packing is injective and no reduction ever happens.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

use crate::error::EncodingError;

/// Number of field elements a string is packed into.
pub const FIELD_ELEMENTS: usize = 38;

/// Characters packed into one field element.
pub const CHARS_PER_ELEMENT: usize = 7;

/// Bytes used per character inside an element.
const BYTES_PER_CHAR: usize = 4;

/// Maximum number of characters a string may have.
pub const INPUT_CAPACITY: usize = FIELD_ELEMENTS * CHARS_PER_ELEMENT;

/// Size in bytes of a canonical field element.
pub const ELEMENT_BYTES: usize = 32;

/// Number of hex digits in a verification code.
pub const CODE_LENGTH: usize = 6;

/// A string packed into field elements; unused trailing elements are zero.
pub type FieldElementVector = [Fr; FIELD_ELEMENTS];

/// Hex digits (0-15) of a verification code, most significant first.
pub type CodeDigits = [u8; CODE_LENGTH];

/// Pack a string into a fixed-size vector of field elements.
pub fn string_to_field_elements(input: &str) -> Result<FieldElementVector, EncodingError> {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() > INPUT_CAPACITY {
        return Err(EncodingError::InputTooLong {
            chars: chars.len(),
            capacity: INPUT_CAPACITY,
        });
    }

    let mut elements = [Fr::from(0u64); FIELD_ELEMENTS];
    for (element, chunk) in elements.iter_mut().zip(chars.chunks(CHARS_PER_ELEMENT)) {
        let mut bytes = [0u8; ELEMENT_BYTES];
        for (slot, c) in bytes.chunks_exact_mut(BYTES_PER_CHAR).zip(chunk) {
            slot.copy_from_slice(&u32::from(*c).to_le_bytes());
        }
        *element = Fr::from_le_bytes_mod_order(&bytes);
    }

    Ok(elements)
}

/// Canonical big-endian bytes of a field element.
pub fn field_element_bytes(element: &Fr) -> [u8; ELEMENT_BYTES] {
    let mut out = [0u8; ELEMENT_BYTES];
    let bytes = element.into_bigint().to_bytes_be();
    out[ELEMENT_BYTES - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Split a lowercase hex verification code into its digits.
pub fn code_to_digits(code: &str) -> Result<CodeDigits, EncodingError> {
    let bytes = code.as_bytes();
    if bytes.len() != CODE_LENGTH {
        return Err(EncodingError::InvalidCodeLength {
            len: code.chars().count(),
            expected: CODE_LENGTH,
        });
    }

    let mut digits = [0u8; CODE_LENGTH];
    for (index, (digit, byte)) in digits.iter_mut().zip(bytes).enumerate() {
        *digit = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            _ => return Err(EncodingError::InvalidCodeCharacter { index }),
        };
    }

    Ok(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string_is_all_zero() {
        let elements = string_to_field_elements("").unwrap();
        assert!(elements.iter().all(|e| *e == Fr::from(0u64)));
    }

    #[test]
    fn test_packing_layout() {
        // "ab" -> 'a' in the low 32 bits, 'b' in the next 32 bits
        let elements = string_to_field_elements("ab").unwrap();
        let expected = Fr::from(0x61u64 + (0x62u64 << 32));
        assert_eq!(elements[0], expected);
        assert_eq!(elements[1], Fr::from(0u64));
    }

    #[test]
    fn test_eighth_char_starts_next_element() {
        let elements = string_to_field_elements("aaaaaaab").unwrap();
        assert_eq!(elements[1], Fr::from(0x62u64));
    }

    #[test]
    fn test_multibyte_chars_use_code_points() {
        let elements = string_to_field_elements("用").unwrap();
        assert_eq!(elements[0], Fr::from('用' as u64));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let at_capacity = "x".repeat(INPUT_CAPACITY);
        assert!(string_to_field_elements(&at_capacity).is_ok());

        let too_long = "x".repeat(INPUT_CAPACITY + 1);
        assert_eq!(
            string_to_field_elements(&too_long),
            Err(EncodingError::InputTooLong { chars: 267, capacity: 266 })
        );
    }

    #[test]
    fn test_field_element_bytes_big_endian() {
        let bytes = field_element_bytes(&Fr::from(0x0102u64));
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
        assert!(bytes[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_code_to_digits() {
        assert_eq!(code_to_digits("724b2c").unwrap(), [7, 2, 4, 11, 2, 12]);
        assert_eq!(code_to_digits("000fff").unwrap(), [0, 0, 0, 15, 15, 15]);
    }

    #[test]
    fn test_code_to_digits_rejects_bad_input() {
        assert_eq!(
            code_to_digits("724B2c"),
            Err(EncodingError::InvalidCodeCharacter { index: 3 })
        );
        assert_eq!(
            code_to_digits("72g4b2"),
            Err(EncodingError::InvalidCodeCharacter { index: 2 })
        );
        assert_eq!(
            code_to_digits("724b2"),
            Err(EncodingError::InvalidCodeLength { len: 5, expected: 6 })
        );
        assert!(code_to_digits("724b2cc").is_err());
    }
}
