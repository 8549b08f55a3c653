//! Storage-read requests
//!
//! A [`GatewayRequest`] is a small program over contract storage: it picks a
//! target contract and base slot, derives nested mapping slots from pushed
//! keys, and reads values into a fixed number of outputs. The same program
//! is evaluated by the off-chain agent when answering and by the verifier
//! when re-checking the answer, so both sides agree on which slots matter.

use crate::errors::*;
use namecred_types::{keccak256_concat, Address, Node};
use serde::{Deserialize, Serialize};

/// Single instruction of a request program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    /// Contract whose storage subsequent reads address
    SetTarget(Address),
    /// Reset the current slot
    SetSlot([u8; 32]),
    /// Push a mapping key
    Push(Vec<u8>),
    /// Pop a key and descend: `slot = keccak256(pad32(key) || slot)`
    Follow,
    /// Read the current slot into the current output
    Read,
    /// Select the output written by the next read
    SetOutput(u8),
}

/// Something that can answer storage reads for a program.
pub trait StorageReader {
    type Error: From<GatewayError>;

    fn read_slot(&self, target: &Address, slot: &[u8; 32]) -> std::result::Result<Vec<u8>, Self::Error>;
}

/// Storage-read request; built fresh per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GatewayRequest {
    ops: Vec<Op>,
    output_count: u8,
}

impl GatewayRequest {
    /// Empty program declaring `output_count` outputs.
    pub fn new(output_count: u8) -> Self {
        Self {
            ops: Vec::new(),
            output_count,
        }
    }

    /// Value stored under `base_slot[address][coin_type]` of `target`.
    pub fn by_address(target: Address, base_slot: u64, address: &Address, coin_type: u64) -> Self {
        Self::new(1)
            .set_target(target)
            .set_slot(base_slot)
            .push_address(address)
            .follow()
            .push_u64(coin_type)
            .follow()
            .read()
    }

    /// Value stored under `base_slot[node]` of `target`.
    pub fn by_node(target: Address, base_slot: u64, node: &Node) -> Self {
        Self::new(1)
            .set_target(target)
            .set_slot(base_slot)
            .push_node(node)
            .follow()
            .read()
    }

    pub fn set_target(mut self, target: Address) -> Self {
        self.ops.push(Op::SetTarget(target));
        self
    }

    pub fn set_slot(mut self, slot: u64) -> Self {
        self.ops.push(Op::SetSlot(u64_word(slot)));
        self
    }

    pub fn push_bytes(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.ops.push(Op::Push(key.into()));
        self
    }

    pub fn push_address(self, address: &Address) -> Self {
        self.push_bytes(address.to_word().to_vec())
    }

    pub fn push_u64(self, value: u64) -> Self {
        self.push_bytes(u64_word(value).to_vec())
    }

    pub fn push_node(self, node: &Node) -> Self {
        self.push_bytes(node.as_bytes().to_vec())
    }

    pub fn follow(mut self) -> Self {
        self.ops.push(Op::Follow);
        self
    }

    pub fn read(mut self) -> Self {
        self.ops.push(Op::Read);
        self
    }

    pub fn set_output(mut self, index: u8) -> Self {
        self.ops.push(Op::SetOutput(index));
        self
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn output_count(&self) -> usize {
        self.output_count as usize
    }

    /// Evaluate the program against `reader`.
    ///
    /// Returns one value per declared output; outputs never read stay empty.
    pub fn execute<R: StorageReader>(&self, reader: &R) -> std::result::Result<Vec<Vec<u8>>, R::Error> {
        let count = self.output_count();
        let mut outputs = vec![Vec::new(); count];
        let mut target: Option<Address> = None;
        let mut slot = [0u8; 32];
        let mut stack: Vec<&[u8]> = Vec::new();
        let mut output = 0usize;

        for op in &self.ops {
            match op {
                Op::SetTarget(address) => target = Some(*address),
                Op::SetSlot(base) => slot = *base,
                Op::Push(key) => stack.push(key),
                Op::Follow => {
                    let key = stack.pop().ok_or(GatewayError::EmptyStack)?;
                    slot = follow(key, &slot);
                }
                Op::Read => {
                    let target = target.as_ref().ok_or(GatewayError::NoTarget)?;
                    let value = reader.read_slot(target, &slot)?;
                    let out = outputs
                        .get_mut(output)
                        .ok_or(GatewayError::OutputOutOfRange { index: output, count })?;
                    *out = value;
                }
                Op::SetOutput(index) => output = *index as usize,
            }
        }

        Ok(outputs)
    }
}

/// Mapping slot for `key` under `slot`.
///
/// Keys shorter than a word are left-padded to 32 bytes; longer keys are
/// hashed as-is.
pub fn follow(key: &[u8], slot: &[u8; 32]) -> [u8; 32] {
    if key.len() < 32 {
        let mut padded = [0u8; 32];
        padded[32 - key.len()..].copy_from_slice(key);
        keccak256_concat(&[&padded, slot])
    } else {
        keccak256_concat(&[key, slot])
    }
}

/// Slot reached from `base_slot` by following `keys` in order.
pub fn derive_slot(base_slot: u64, keys: &[&[u8]]) -> [u8; 32] {
    keys.iter()
        .fold(u64_word(base_slot), |slot, key| follow(key, &slot))
}

pub(crate) fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}
