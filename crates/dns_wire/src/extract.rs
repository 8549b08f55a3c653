//! Identifier extraction from wildcard names
//!
//! Names handled by the resolver have the shape
//! `<identifier> . <marker> . <label> . <suffix>`, for example
//! `domain.com.name.tag.eth`. The identifier is everything left of the marker
//! label and is returned re-terminated as a wire name of its own.

use crate::errors::*;
use crate::wire::{read_label, WireName, MAX_LABEL_LEN};
use tracing::trace;

/// Shortest buffer that can carry an identifier, marker, label and suffix.
pub const MIN_NAME_LEN: usize = 10;

/// Extract the identifier that precedes `marker`.
///
/// The scan moves strictly forward. A marker only counts when it is followed
/// by exactly one well-formed label and then by `suffix` and the zero
/// terminator; otherwise the candidate is dropped and scanning resumes at the
/// label after that marker.
pub fn extract_identifier(name: &[u8], marker: &[u8], suffix: &[u8]) -> Result<Vec<u8>> {
    if name.len() < MIN_NAME_LEN {
        return Err(WireNameError::malformed(
            0,
            MalformedReason::TooShort {
                len: name.len(),
                min: MIN_NAME_LEN,
            },
        ));
    }

    let mut pos = 0;
    while let Some((label, next)) = read_label(name, pos)? {
        if label == marker && suffix_follows(name, next, suffix)? {
            trace!(split = pos, "marker accepted");
            let mut identifier = Vec::with_capacity(pos + 1);
            identifier.extend_from_slice(&name[..pos]);
            identifier.push(0);
            return Ok(identifier);
        }
        pos = next;
    }

    Err(WireNameError::NoMatchFound)
}

/// Skip one label at `pos` and check for `suffix` plus the terminator.
fn suffix_follows(name: &[u8], pos: usize, suffix: &[u8]) -> Result<bool> {
    let Some((_, after_label)) = read_label(name, pos)? else {
        return Ok(false);
    };
    let Some((candidate, after_suffix)) = read_label(name, after_label)? else {
        return Ok(false);
    };
    Ok(candidate == suffix && name.get(after_suffix) == Some(&0))
}

/// Marker/suffix pair configured once and applied to many names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierExtractor {
    marker: Vec<u8>,
    suffix: Vec<u8>,
}

impl IdentifierExtractor {
    pub fn new(marker: impl Into<Vec<u8>>, suffix: impl Into<Vec<u8>>) -> Result<Self> {
        let marker = marker.into();
        let suffix = suffix.into();
        for label in [&marker, &suffix] {
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(WireNameError::InvalidLabel {
                    label: String::from_utf8_lossy(label).into_owned(),
                    reason: "marker and suffix must be 1..=63 bytes",
                });
            }
        }
        Ok(Self { marker, suffix })
    }

    pub fn marker(&self) -> &[u8] {
        &self.marker
    }

    pub fn suffix(&self) -> &[u8] {
        &self.suffix
    }

    /// Extract the identifier as a validated wire name.
    pub fn extract(&self, name: &[u8]) -> Result<WireName> {
        let identifier = extract_identifier(name, &self.marker, &self.suffix)?;
        WireName::parse(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::encode;

    fn wire(dotted: &str) -> Vec<u8> {
        encode(dotted).unwrap().into_bytes()
    }

    #[test]
    fn extracts_identifier_before_marker() {
        let name = b"\x06domain\x03com\x04name\x03tag\x03eth\x00";
        let id = extract_identifier(name, b"name", b"eth").unwrap();
        assert_eq!(id, b"\x06domain\x03com\x00".to_vec());
    }

    #[test]
    fn too_short_is_malformed() {
        let err = extract_identifier(b"\x04name\x00", b"name", b"eth").unwrap_err();
        assert!(matches!(
            err,
            WireNameError::MalformedEncoding {
                reason: MalformedReason::TooShort { len: 6, min: 10 },
                ..
            }
        ));
    }

    #[test]
    fn no_marker_is_no_match() {
        let name = wire("alice.example.tag.eth");
        assert_eq!(
            extract_identifier(&name, b"name", b"eth"),
            Err(WireNameError::NoMatchFound)
        );
    }

    #[test]
    fn marker_without_suffix_is_abandoned() {
        // marker present, but followed by two labels before the terminator
        let name = wire("alice.name.tag.eth.org");
        assert_eq!(
            extract_identifier(&name, b"name", b"eth"),
            Err(WireNameError::NoMatchFound)
        );
    }

    #[test]
    fn spurious_earlier_marker_is_skipped() {
        let name = wire("name.alice.name.tag.eth");
        let id = extract_identifier(&name, b"name", b"eth").unwrap();
        assert_eq!(id, wire("name.alice"));
    }

    #[test]
    fn marker_label_can_be_the_skipped_label() {
        // x.name.name.eth: the first marker skips "name" and sees "eth"
        let name = wire("x.name.name.eth");
        let id = extract_identifier(&name, b"name", b"eth").unwrap();
        assert_eq!(id, wire("x"));
    }

    #[test]
    fn marker_at_start_yields_root() {
        let raw = b"\x04name\x03tag\x03eth\x00";
        assert_eq!(extract_identifier(raw, b"name", b"eth").unwrap(), vec![0]);
    }

    #[test]
    fn overrun_inside_skipped_label_is_malformed() {
        let raw = b"\x01a\x04name\x09tag\x03eth\x00";
        let err = extract_identifier(raw, b"name", b"eth").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn missing_terminator_is_malformed() {
        let raw = b"\x06domain\x03com\x03abc";
        let err = extract_identifier(raw, b"name", b"eth").unwrap_err();
        assert!(matches!(
            err,
            WireNameError::MalformedEncoding {
                reason: MalformedReason::MissingTerminator,
                ..
            }
        ));
    }

    #[test]
    fn extractor_validates_configuration() {
        assert!(IdentifierExtractor::new("", "eth").is_err());
        let extractor = IdentifierExtractor::new("name", "eth").unwrap();
        let id = extractor
            .extract(&wire("vitalik.eth.name.tag.eth"))
            .unwrap();
        assert_eq!(id.to_dotted(), "vitalik.eth");
    }
}
