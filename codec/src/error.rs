//! Error types for codec operations.

use std::fmt;

use bitstream::BitError;
use thiserror::Error;
use wire::{ControlType, DecodeError, EncodeError};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding or encoding typed SRT structures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Envelope or header error.
    #[error("wire error: {0}")]
    Wire(#[from] DecodeError),

    /// A header field did not fit its bit width.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Bitstream error.
    #[error("bitstream error: {0}")]
    Bitstream(#[from] BitError),

    /// CIF too short for its control type, or no layout matches its length.
    #[error("{control_type} CIF of {actual} bytes does not match any layout")]
    TruncatedCif {
        control_type: ControlType,
        actual: usize,
    },

    /// A range-start word without its range-end word, or a partial word.
    #[error("loss list of {bytes} bytes ends inside an entry")]
    TruncatedLossList { bytes: usize },

    /// Key material shorter than its header implies.
    #[error("key material truncated: need {required} bytes, have {actual}")]
    TruncatedKeyMaterial { required: usize, actual: usize },

    /// Key material longer than its header implies.
    #[error("key material has {actual} bytes, header describes {expected}")]
    TrailingKeyMaterial { expected: usize, actual: usize },

    /// Fixed-size extension contents of the wrong size.
    #[error("extension {ext_type} has {actual} content bytes, expected {expected}")]
    TruncatedExtension {
        ext_type: u16,
        expected: usize,
        actual: usize,
    },

    /// Extension block claims more bytes than its container holds.
    #[error("extension at offset {offset} declares {declared} bytes, {available} remain")]
    ExtensionOverrun {
        offset: usize,
        declared: usize,
        available: usize,
    },

    /// Extension block whose length word disagrees with its contents.
    #[error("extension {ext_type} declares {length_words} words but holds {content_bytes} bytes")]
    ExtensionLengthMismatch {
        ext_type: u16,
        length_words: u16,
        content_bytes: usize,
    },

    /// Key material `KK` of zero: no stream key provided.
    #[error("invalid key flag 0b{value:02b} in key material")]
    InvalidKeyFlag { value: u8 },

    /// Key material packet type outside {0, 1, 2, 7}.
    #[error("invalid key material packet type {value}")]
    InvalidPacketType { value: u8 },

    /// Key material signature is not `0x2029`.
    #[error("bad key material signature 0x{found:04x}")]
    BadSignature { found: u16 },

    /// A reserved bit that must be zero was set.
    #[error("reserved bit set in {field}")]
    ReservedBitSet { field: &'static str },

    /// A byte length that must be a multiple of four.
    #[error("{field} length {len} is not a multiple of 4")]
    UnalignedLength { field: &'static str, len: usize },

    /// Wrapped key block that cannot hold the advertised keys plus ICV.
    #[error("wrap of {len} bytes cannot hold {keys} key(s) and an 8-byte ICV")]
    InvalidWrapLength { len: usize, keys: usize },

    /// String extension that is not valid UTF-8, or a string ending in NUL,
    /// which padding would swallow.
    #[error("extension {ext_type} is not a valid string")]
    InvalidString { ext_type: u16 },

    /// `Raw` or user-defined CIF spelling a header that decodes to another
    /// variant.
    #[error("control type 0x{control_type:04x} subtype {subtype} has a typed CIF")]
    NonCanonicalCif { control_type: u16, subtype: u16 },

    /// Limits exceeded.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Specific codec limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    LossEntries,
    ExtensionBlocks,
    StreamIdBytes,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LossEntries => "loss entries",
            Self::ExtensionBlocks => "extension blocks",
            Self::StreamIdBytes => "stream id bytes",
        };
        write!(f, "{name}")
    }
}

impl CodecError {
    pub(crate) const fn field_overflow(field: &'static str, value: u64, bits: u8) -> Self {
        Self::Encode(EncodeError::FieldOverflow { field, value, bits })
    }
}
