//! Error types for wire name handling

use thiserror::Error;

/// Why a buffer is not a well-formed wire name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("buffer of {len} bytes is shorter than the minimum of {min}")]
    TooShort { len: usize, min: usize },

    #[error("label declares {declared} bytes but only {available} remain")]
    LengthOverrun { declared: usize, available: usize },

    #[error("buffer ends before the zero terminator")]
    MissingTerminator,

    #[error("{0} bytes follow the zero terminator")]
    TrailingBytes(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireNameError {
    /// The buffer violates the length/terminator invariants.
    #[error("malformed wire name at offset {offset}: {reason}")]
    MalformedEncoding {
        offset: usize,
        reason: MalformedReason,
    },

    /// Well-formed name, but no marker label followed by one label and the
    /// terminal suffix.
    #[error("no marker label followed by the expected suffix")]
    NoMatchFound,

    #[error("invalid label {label:?}: {reason}")]
    InvalidLabel { label: String, reason: &'static str },
}

impl WireNameError {
    pub(crate) fn malformed(offset: usize, reason: MalformedReason) -> Self {
        Self::MalformedEncoding { offset, reason }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedEncoding { .. })
    }
}

pub type Result<T> = std::result::Result<T, WireNameError>;
