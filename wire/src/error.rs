//! Error types for wire format operations.

use std::fmt;

use bitstream::BitError;
use thiserror::Error;

use crate::packet::PacketKind;

/// Result type for wire format operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Decode errors for the packet envelope and the two header families.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Buffer is shorter than the fixed header.
    #[error("malformed header: {actual} bytes, need at least {required}")]
    MalformedHeader { actual: usize, required: usize },

    /// Limits exceeded.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Data packet carries the control-only key flag `0b11`.
    #[error("invalid key flag 0b{value:02b} in data packet")]
    InvalidKeyFlag { value: u8 },

    /// A header decoder was handed the other packet family.
    #[error("expected a {expected} packet")]
    UnexpectedPacketKind { expected: PacketKind },

    /// Cursor error from the underlying bit reader.
    #[error("bitstream error: {0}")]
    Bitstream(#[from] BitError),
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    PacketBytes,
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// A value is wider than the bit field it is packed into.
    #[error("{field} value {value} does not fit in {bits} bits")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        bits: u8,
    },

    /// `ControlType::Unknown` holding the value of a known control type.
    #[error("control type 0x{raw:04x} must use its named variant")]
    NonCanonicalControlType { raw: u16 },

    /// Cursor error from the underlying bit writer.
    #[error("bitstream error: {0}")]
    Bitstream(#[from] BitError),
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PacketBytes => "packet bytes",
        };
        write!(f, "{name}")
    }
}
