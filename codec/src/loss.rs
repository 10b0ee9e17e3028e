//! NAK loss list: compressed lists of lost sequence numbers.
//!
//! Each entry is one or two 32-bit words. A word with the high bit clear is a
//! single lost sequence number. A word with the high bit set starts a range;
//! the following word is the inclusive end of that range.

use bitstream::{BitField, BitReader, BitWriter};
use wire::pack_field;

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;

const RANGE_FLAG: BitField = BitField::new(0, 1);
const SEQ: BitField = BitField::new(1, 31);

/// One entry of a loss list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LossEntry {
    Single(u32),
    /// Inclusive range of sequence numbers.
    Range { from: u32, to: u32 },
}

impl LossEntry {
    /// Number of wire words this entry occupies.
    #[must_use]
    pub const fn word_count(self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Range { .. } => 2,
        }
    }
}

/// Ordered list of loss entries, in wire order.
pub type LossList = Vec<LossEntry>;

/// Decodes a loss list.
///
/// Entries are returned exactly as sent: no sorting, merging or overlap checks.
pub fn decode_loss_list(buf: &[u8], limits: &CodecLimits) -> CodecResult<LossList> {
    if buf.len() % 4 != 0 {
        return Err(CodecError::TruncatedLossList { bytes: buf.len() });
    }

    let mut reader = BitReader::new(buf);
    let mut entries = Vec::new();
    while !reader.is_empty() {
        if entries.len() == limits.max_loss_entries {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::LossEntries,
                limit: limits.max_loss_entries,
                actual: entries.len() + 1,
            });
        }

        let word = reader.read_u32_aligned()?;
        let from = SEQ.extract(word);
        if RANGE_FLAG.extract(word) == 0 {
            entries.push(LossEntry::Single(from));
            continue;
        }

        if reader.is_empty() {
            return Err(CodecError::TruncatedLossList { bytes: buf.len() });
        }
        let to = SEQ.extract(reader.read_u32_aligned()?);
        entries.push(LossEntry::Range { from, to });
    }

    Ok(entries)
}

/// Encodes a loss list.
///
/// # Errors
///
/// `FieldOverflow` if a sequence number does not fit in 31 bits.
pub fn encode_loss_list(entries: &[LossEntry]) -> CodecResult<Vec<u8>> {
    let words: usize = entries.iter().map(|e| e.word_count()).sum();
    let mut writer = BitWriter::with_capacity(words * 4);
    for entry in entries {
        match *entry {
            LossEntry::Single(seq) => {
                writer.write_u32_aligned(pack_field(0, SEQ, seq, "lost sequence number")?)?;
            }
            LossEntry::Range { from, to } => {
                let start = pack_field(1 << 31, SEQ, from, "range start")?;
                writer.write_u32_aligned(start)?;
                writer.write_u32_aligned(pack_field(0, SEQ, to, "range end")?)?;
            }
        }
    }
    Ok(writer.finish())
}
