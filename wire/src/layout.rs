//! Bit layouts of the 32-bit header words.
//!
//! Every packed header field is declared here once and packed through
//! [`pack_field`], so width violations surface as [`EncodeError::FieldOverflow`]
//! instead of silently spilling into neighbouring bits.

use bitstream::BitField;

use crate::error::EncodeError;

/// Word 0, bit 0: packet family (0 data, 1 control).
pub const F: BitField = BitField::new(0, 1);
/// Word 0, bits 1..32: sequence number or control type + subtype.
pub const TYPE_FIELD: BitField = BitField::new(1, 31);

/// Control word 0: control type.
pub const CONTROL_TYPE: BitField = BitField::new(1, 15);
/// Control word 0: subtype.
pub const SUBTYPE: BitField = BitField::new(16, 16);

/// Data word 1: packet position.
pub const PP: BitField = BitField::new(0, 2);
/// Data word 1: in-order delivery flag.
pub const O: BitField = BitField::new(2, 1);
/// Data word 1: encryption key flag.
pub const KK: BitField = BitField::new(3, 2);
/// Data word 1: retransmission flag.
pub const R: BitField = BitField::new(5, 1);
/// Data word 1: message number.
pub const MSGNO: BitField = BitField::new(6, 26);

/// Packs `value` into `field` of `word`.
///
/// # Errors
///
/// Returns [`EncodeError::FieldOverflow`] naming `name` when `value` is wider
/// than the field. `word` is not modified in that case.
pub fn pack_field(
    word: u32,
    field: BitField,
    value: u32,
    name: &'static str,
) -> Result<u32, EncodeError> {
    field
        .insert(word, value)
        .map_err(|_| EncodeError::FieldOverflow {
            field: name,
            value: u64::from(value),
            bits: field.width(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_word_fields_tile_the_word() {
        let masks = [PP, O, KK, R, MSGNO].map(BitField::mask);
        let mut acc = 0u32;
        for mask in masks {
            assert_eq!(acc & mask, 0, "fields overlap");
            acc |= mask;
        }
        assert_eq!(acc, u32::MAX);
    }

    #[test]
    fn control_word_fields_tile_the_word() {
        assert_eq!(F.mask() | CONTROL_TYPE.mask() | SUBTYPE.mask(), u32::MAX);
        assert_eq!(F.mask() | TYPE_FIELD.mask(), u32::MAX);
    }

    #[test]
    fn pack_field_reports_name_and_width() {
        let err = pack_field(0, MSGNO, 0x0400_0000, "message number").unwrap_err();
        assert_eq!(
            err,
            EncodeError::FieldOverflow {
                field: "message number",
                value: 0x0400_0000,
                bits: 26,
            }
        );
    }

    #[test]
    fn pack_field_keeps_neighbours() {
        let word = pack_field(0xC000_0000, MSGNO, 0x03FF_FFFF, "message number").unwrap();
        assert_eq!(word, 0xC3FF_FFFF);
    }
}
