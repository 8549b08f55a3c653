//! Suspend signal of the remote-read protocol

use crate::request::GatewayRequest;
use namecred_types::{Address, Selector};
use serde::{Deserialize, Serialize};

/// Raised by a resolver that needs off-chain data.
///
/// The caller hands `request` to an agent at one of `urls`, then resumes by
/// invoking `callback` on `sender` with the agent's response and the opaque
/// `extra_data` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainLookup {
    pub sender: Address,
    pub urls: Vec<String>,
    pub request: GatewayRequest,
    pub callback: Selector,
    pub extra_data: Vec<u8>,
}
