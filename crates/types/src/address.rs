use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when parsing an address string.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum AddressError {
    #[error("address must start with '0x'")]
    InvalidPrefix,
    #[error("address must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("address payload is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Number of raw bytes contained in an address.
pub const ADDRESS_BYTES: usize = 20;
/// Expected string length of an encoded address (prefix + 40 hex chars).
pub const ADDRESS_STRING_LENGTH: usize = 2 + ADDRESS_BYTES * 2;

/// Account or contract identifier.
///
/// The all-zero address is the null resolver: binding a namespace to it is
/// the defined removal signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_BYTES]);

impl Address {
    /// The null address.
    pub const ZERO: Address = Address([0u8; ADDRESS_BYTES]);

    pub const fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    /// Build an address whose every byte is `byte`; handy for fixtures.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; ADDRESS_BYTES])
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_BYTES]
    }

    /// Left-pad the address into a 32-byte word.
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[32 - ADDRESS_BYTES..].copy_from_slice(&self.0);
        word
    }

    /// Parse a bare 40-character hex string, with or without `0x`.
    pub fn from_hex_loose(value: &str) -> Result<Self, AddressError> {
        let payload = value.strip_prefix("0x").unwrap_or(value);
        if payload.len() != ADDRESS_BYTES * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_BYTES * 2,
                actual: payload.len(),
            });
        }
        let mut bytes = [0u8; ADDRESS_BYTES];
        hex::decode_to_slice(payload, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Encode an address into its `0x`-prefixed lowercase hex form.
pub fn encode_address(bytes: &[u8; ADDRESS_BYTES]) -> String {
    let mut encoded = String::with_capacity(ADDRESS_STRING_LENGTH);
    encoded.push_str("0x");
    encoded.push_str(&hex::encode(bytes));
    encoded
}

/// Decode a `0x`-prefixed address string into raw bytes.
pub fn decode_address(address: &str) -> Result<[u8; ADDRESS_BYTES], AddressError> {
    if !address.starts_with("0x") {
        return Err(AddressError::InvalidPrefix);
    }

    if address.len() != ADDRESS_STRING_LENGTH {
        return Err(AddressError::InvalidLength {
            expected: ADDRESS_STRING_LENGTH,
            actual: address.len(),
        });
    }

    let mut bytes = [0u8; ADDRESS_BYTES];
    hex::decode_to_slice(&address[2..], &mut bytes)?;
    Ok(bytes)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_address(&self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_address(s).map(Address)
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(value: [u8; ADDRESS_BYTES]) -> Self {
        Address(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        encode_address(&value.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        decode_address(&value).map(Address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let bytes = [0xABu8; ADDRESS_BYTES];
        let encoded = encode_address(&bytes);
        assert!(encoded.starts_with("0x"));
        assert_eq!(encoded.len(), ADDRESS_STRING_LENGTH);

        let decoded = decode_address(&encoded).expect("address should decode");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn invalid_prefix_rejected() {
        let bad = "ff".to_string() + &"00".repeat(ADDRESS_BYTES);
        let err = decode_address(&bad).unwrap_err();
        assert_eq!(err, AddressError::InvalidPrefix);
    }

    #[test]
    fn invalid_length_rejected() {
        let bad = "0x".to_string() + &"00".repeat(ADDRESS_BYTES - 1);
        let err = decode_address(&bad).unwrap_err();
        assert!(matches!(err, AddressError::InvalidLength { .. }));
    }

    #[test]
    fn invalid_hex_rejected() {
        let bad = "0x".to_string() + &"zz".repeat(ADDRESS_BYTES);
        let err = decode_address(&bad).unwrap_err();
        assert_eq!(
            err,
            AddressError::InvalidHex(hex::FromHexError::InvalidHexCharacter { c: 'z', index: 0 })
        );
    }

    #[test]
    fn loose_parse_accepts_bare_hex() {
        let addr = Address::from_hex_loose(&"11".repeat(ADDRESS_BYTES)).unwrap();
        assert_eq!(addr, Address::repeat_byte(0x11));
        assert!(Address::from_hex_loose("0x1234").is_err());
    }

    #[test]
    fn word_is_left_padded() {
        let word = Address::repeat_byte(0x22).to_word();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &[0x22u8; 20]);
    }

    #[test]
    fn serde_uses_hex_string() {
        let addr = Address::repeat_byte(0x01);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "01".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
