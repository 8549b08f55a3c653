//! Decoding of raw storage values

use crate::errors::*;
use num_bigint::BigUint;

/// Render a big-endian unsigned integer of at most 32 bytes in decimal.
pub fn decode_uint_decimal(value: &[u8]) -> Result<String> {
    if value.is_empty() {
        return Err(GatewayError::EmptyValue);
    }
    if value.len() > 32 {
        return Err(GatewayError::ValueTooWide(value.len()));
    }
    Ok(BigUint::from_bytes_be(value).to_str_radix(10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_small_and_full_width_values() {
        assert_eq!(decode_uint_decimal(&[0x00]).unwrap(), "0");
        assert_eq!(decode_uint_decimal(&[0x01, 0x00]).unwrap(), "256");

        let mut word = [0u8; 32];
        word[31] = 42;
        assert_eq!(decode_uint_decimal(&word).unwrap(), "42");

        assert_eq!(
            decode_uint_decimal(&[0xff; 32]).unwrap(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert_eq!(decode_uint_decimal(&[]), Err(GatewayError::EmptyValue));
        assert_eq!(
            decode_uint_decimal(&[1u8; 33]),
            Err(GatewayError::ValueTooWide(33))
        );
    }
}
