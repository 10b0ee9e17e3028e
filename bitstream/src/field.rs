//! Fixed-position bit fields inside 32-bit network words.
//!
//! SRT headers pack several heterogeneous values into one big-endian word
//! (for example `PP|O|KK|R|Message Number`). Every codec describes such a
//! word as a set of [`BitField`] constants and goes through [`BitField::extract`]
//! and [`BitField::insert`] instead of shifting by hand.

use crate::error::{BitError, BitResult};

/// A field of `width` bits starting `offset` bits from the most significant
/// bit of a 32-bit word.
///
/// Bit 0 is the MSB, matching the numbering used in protocol diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitField {
    offset: u8,
    width: u8,
}

impl BitField {
    /// Creates a field descriptor.
    ///
    /// # Panics
    ///
    /// Panics if the field is empty or does not fit in 32 bits. Layouts are
    /// declared as constants, so this fires at compile time.
    #[must_use]
    pub const fn new(offset: u8, width: u8) -> Self {
        assert!(width > 0, "bit field must be at least one bit wide");
        assert!(
            offset as u32 + width as u32 <= 32,
            "bit field must fit in a 32-bit word"
        );
        Self { offset, width }
    }

    /// Offset of the field's most significant bit, counted from the word MSB.
    #[must_use]
    pub const fn offset(self) -> u8 {
        self.offset
    }

    /// Width of the field in bits.
    #[must_use]
    pub const fn width(self) -> u8 {
        self.width
    }

    /// Largest value the field can hold.
    #[must_use]
    pub const fn max_value(self) -> u32 {
        if self.width == 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Mask selecting the field's bits in place within the word.
    #[must_use]
    pub const fn mask(self) -> u32 {
        self.max_value() << self.shift()
    }

    /// Returns `true` if `value` fits in the field without truncation.
    #[must_use]
    pub const fn fits(self, value: u32) -> bool {
        value <= self.max_value()
    }

    /// Reads the field out of `word`.
    #[must_use]
    pub const fn extract(self, word: u32) -> u32 {
        (word >> self.shift()) & self.max_value()
    }

    /// Writes `value` into the field of `word`, leaving every other bit untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::ValueOutOfRange`] if `value` is wider than the field.
    pub const fn insert(self, word: u32, value: u32) -> BitResult<u32> {
        if !self.fits(value) {
            return Err(BitError::ValueOutOfRange {
                value: value as u64,
                bits: self.width,
            });
        }
        Ok((word & !self.mask()) | (value << self.shift()))
    }

    const fn shift(self) -> u32 {
        32 - self.offset as u32 - self.width as u32
    }
}
