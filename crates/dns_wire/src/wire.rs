//! Wire name representation, encoding and hashing

use crate::errors::*;
use namecred_types::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest label accepted when encoding from text.
pub const MAX_LABEL_LEN: usize = 63;

/// A structurally valid wire name: labels followed by exactly one zero
/// terminator at the end of the buffer.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireName(Vec<u8>);

impl WireName {
    /// Validate `bytes` as a complete wire name.
    pub fn parse(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let mut pos = 0;
        while let Some((_, next)) = read_label(&bytes, pos)? {
            pos = next;
        }
        let trailing = bytes.len() - pos - 1;
        if trailing > 0 {
            return Err(WireNameError::malformed(
                pos + 1,
                MalformedReason::TrailingBytes(trailing),
            ));
        }
        Ok(Self(bytes))
    }

    /// The empty name.
    pub fn root() -> Self {
        Self(vec![0])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn labels(&self) -> Labels<'_> {
        Labels {
            bytes: &self.0,
            pos: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Dotted text form; non UTF-8 label bytes are replaced.
    pub fn to_dotted(&self) -> String {
        self.labels()
            .map(String::from_utf8_lossy)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn namehash(&self) -> Node {
        namehash(self)
    }
}

impl fmt::Debug for WireName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WireName({:?}, 0x{})", self.to_dotted(), hex::encode(&self.0))
    }
}

impl fmt::Display for WireName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl AsRef<[u8]> for WireName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Iterator over the labels of a validated [`WireName`].
pub struct Labels<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.bytes.get(self.pos)? as usize;
        if len == 0 {
            return None;
        }
        let start = self.pos + 1;
        let label = self.bytes.get(start..start + len)?;
        self.pos = start + len;
        Some(label)
    }
}

/// Read the label starting at `pos`.
///
/// Returns `None` on the zero terminator, otherwise the label bytes and the
/// offset of the following length byte. Never reads past `buf`.
pub(crate) fn read_label(buf: &[u8], pos: usize) -> Result<Option<(&[u8], usize)>> {
    let len = *buf
        .get(pos)
        .ok_or_else(|| WireNameError::malformed(pos, MalformedReason::MissingTerminator))?
        as usize;
    if len == 0 {
        return Ok(None);
    }
    let start = pos + 1;
    let end = start + len;
    if end > buf.len() {
        return Err(WireNameError::malformed(
            pos,
            MalformedReason::LengthOverrun {
                declared: len,
                available: buf.len() - start,
            },
        ));
    }
    Ok(Some((&buf[start..end], end)))
}

/// Encode dotted text (`"domain.com"`) into a wire name. The empty string
/// encodes the root.
pub fn encode(dotted: &str) -> Result<WireName> {
    if dotted.is_empty() {
        return Ok(WireName::root());
    }

    let mut out = Vec::with_capacity(dotted.len() + 2);
    for label in dotted.split('.') {
        if label.is_empty() {
            return Err(WireNameError::InvalidLabel {
                label: dotted.to_string(),
                reason: "empty label",
            });
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(WireNameError::InvalidLabel {
                label: label.to_string(),
                reason: "label longer than 63 bytes",
            });
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(WireName(out))
}

/// Recursive namespace hash of a wire name, folding labels right to left.
pub fn namehash(name: &WireName) -> Node {
    let labels: Vec<&[u8]> = name.labels().collect();
    labels
        .iter()
        .rev()
        .fold(Node::ROOT, |parent, label| parent.child(label))
}

/// Namespace hash of dotted text.
pub fn namehash_dotted(dotted: &str) -> Result<Node> {
    Ok(namehash(&encode(dotted)?))
}
