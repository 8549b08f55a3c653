//! Minimal call-data codec for the resolution entry point.
//!
//! Only the shapes the router needs are supported: a `(bytes32, string)`
//! argument tuple behind a selector and a single dynamic `string` return
//! value. Words are 32 bytes, big-endian, dynamic data is referenced by
//! offset and padded to a word boundary.

use crate::hash::{Node, Selector};
use thiserror::Error;

pub const WORD: usize = 32;

/// `text(bytes32,string)`
pub const TEXT_SELECTOR: Selector = Selector([0x59, 0xd1, 0xd4, 0x3c]);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("call data shorter than a selector ({0} bytes)")]
    MissingSelector(usize),
    #[error("word at offset {offset} is out of bounds (len {len})")]
    OutOfBounds { offset: usize, len: usize },
    #[error("length or offset word does not fit in usize")]
    Overflow,
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}

pub type AbiResult<T> = std::result::Result<T, AbiError>;

/// Split call data into its selector and argument payload.
pub fn split_selector(data: &[u8]) -> AbiResult<(Selector, &[u8])> {
    if data.len() < 4 {
        return Err(AbiError::MissingSelector(data.len()));
    }
    let selector = Selector([data[0], data[1], data[2], data[3]]);
    Ok((selector, &data[4..]))
}

/// Encode a `text(node, key)` call.
pub fn encode_text_call(node: &Node, key: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 3 * WORD + padded_len(key.len()));
    out.extend_from_slice(&TEXT_SELECTOR.0);
    out.extend_from_slice(node.as_bytes());
    out.extend_from_slice(&usize_word(2 * WORD));
    push_dynamic(&mut out, key.as_bytes());
    out
}

/// Decode the arguments of a `text(bytes32,string)` call (selector stripped).
pub fn decode_text_args(args: &[u8]) -> AbiResult<(Node, String)> {
    let node = Node(*read_word(args, 0)?);
    let key = read_dynamic_string(args, WORD)?;
    Ok((node, key))
}

/// Encode a single `string` return value.
pub fn encode_string(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 * WORD + padded_len(value.len()));
    out.extend_from_slice(&usize_word(WORD));
    push_dynamic(&mut out, value.as_bytes());
    out
}

/// Decode a single `string` return value.
pub fn decode_string(data: &[u8]) -> AbiResult<String> {
    read_dynamic_string(data, 0)
}

fn read_dynamic_string(data: &[u8], head_offset: usize) -> AbiResult<String> {
    let offset = word_to_usize(read_word(data, head_offset)?)?;
    let len = word_to_usize(read_word(data, offset)?)?;
    let start = offset.checked_add(WORD).ok_or(AbiError::Overflow)?;
    let end = start.checked_add(len).ok_or(AbiError::Overflow)?;
    let bytes = data.get(start..end).ok_or(AbiError::OutOfBounds {
        offset: start,
        len: data.len(),
    })?;
    String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)
}

fn read_word(data: &[u8], offset: usize) -> AbiResult<&[u8; WORD]> {
    let end = offset.checked_add(WORD).ok_or(AbiError::Overflow)?;
    data.get(offset..end)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(AbiError::OutOfBounds {
            offset,
            len: data.len(),
        })
}

fn word_to_usize(word: &[u8; WORD]) -> AbiResult<usize> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(tail)).map_err(|_| AbiError::Overflow)
}

fn usize_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

fn push_dynamic(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(out.len() + padded_len(bytes.len()) - bytes.len(), 0);
}
