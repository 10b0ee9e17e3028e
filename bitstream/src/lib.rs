//! Network-order bit packing primitives for the SRT packet codec.
//!
//! This crate provides [`BitField`] for fixed-position fields inside 32-bit
//! header words, and [`BitWriter`] / [`BitReader`] for cursor-based encoding
//! and decoding. It is designed for bounded, panic-free operation with
//! explicit error handling.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads/writes are bounds-checked.
//! - **No domain knowledge** - This crate knows nothing about packets or control types.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitField, BitReader, BitWriter};
//!
//! const FLAG: BitField = BitField::new(0, 1);
//! const SEQ: BitField = BitField::new(1, 31);
//!
//! let word = SEQ.insert(FLAG.insert(0, 1).unwrap(), 42).unwrap();
//!
//! let mut writer = BitWriter::new();
//! writer.write_u32_aligned(word).unwrap();
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! let word = reader.read_u32_aligned().unwrap();
//! assert_eq!(FLAG.extract(word), 1);
//! assert_eq!(SEQ.extract(word), 42);
//! ```

mod error;
mod field;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use field::BitField;
pub use reader::BitReader;
pub use writer::BitWriter;
