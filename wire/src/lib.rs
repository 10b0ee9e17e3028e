//! Wire framing for SRT packets.
//!
//! This crate handles the 16-byte packet envelope and the two header
//! families that share it: the data header with its packed message word, and
//! the control header with its control type, subtype and type-specific info.
//! Control information fields are handed out as raw slices; interpreting them
//! is the job of the codec layer.
//!
//! # Design Principles
//!
//! - **Bit-exact** - Every packed field is declared once in [`layout`] and
//!   packed through [`pack_field`], which rejects values wider than the field.
//! - **Bounded decoding** - Datagram size is checked against [`Limits`] first.
//! - **Zero copy** - Decoded headers borrow their bodies from the input buffer.

pub mod layout;

mod control;
mod data;
mod error;
mod limits;
mod packet;

pub use control::{decode_control_header, encode_control_header, ControlHeader, ControlType};
pub use data::{decode_data_packet, encode_data_packet, DataPacket, KeyFlag, PacketPosition};
pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use layout::pack_field;
pub use limits::Limits;
pub use packet::{
    decode_packet, encode_packet, encode_packet_into, Packet, PacketKind, HEADER_SIZE,
};
