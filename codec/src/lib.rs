//! Typed SRT control information, handshake extensions and key material.
//!
//! This crate sits on top of `wire` and turns raw control information fields
//! into typed values: ACK layouts, NAK loss lists, handshakes with their
//! extension chains, and key material envelopes. [`decode_srt_packet`] and
//! [`encode_srt_packet`] do the whole job for one datagram.
//!
//! # Features
//!
//! - Length-selected ACK layouts (light, small, full)
//! - Loss list compression with single and range entries
//! - Handshake extension chains with typed HSREQ/KMREQ/SID/GROUP contents
//! - Key material envelopes with derived salt and key lengths
//! - Cross-structure checks in [`validate`]
//!
//! # Design Principles
//!
//! - **Correctness first** - Malformed input is rejected, never partially interpreted.
//! - **Bounded** - Variable-length lists are walked by cursors bounded by their
//!   container and capped by [`CodecLimits`].
//! - **One structure at a time** - Decoders never consult each other; checks
//!   that need two structures live in [`validate`].

pub mod validate;

mod ack;
mod cif;
mod error;
mod extension;
mod handshake;
mod keymat;
mod limits;
mod loss;
mod packet;

pub use ack::{decode_ack, encode_ack, Ack};
pub use cif::{decode_control_cif, encode_control_cif, Cif, PEER_ERROR_FILE_SYSTEM};
pub use error::{CodecError, CodecResult, LimitKind};
pub use extension::{
    decode_extension_chain, encode_extension_chain, Extension, ExtensionBlock, ExtensionType,
    GroupMembership, GroupType, HsExtension, SrtFlags, EXTENSION_HEADER_SIZE,
    STREAM_ID_MAX_BYTES,
};
pub use handshake::{
    decode_handshake, encode_handshake, EncryptionField, ExtensionFlags, Handshake,
    HandshakeType, HANDSHAKE_FIXED_SIZE,
};
pub use keymat::{
    decode_key_material, encode_key_material, KeyFlags, KeyMaterial, KmPacketType,
    AUTH_NONE, CIPHER_AES_CTR, CIPHER_NONE, ICV_SIZE, KM_HEADER_SIZE, KM_SIGN,
    SE_MPEG_TS_SRT, SE_MPEG_TS_UDP, SE_UNSPECIFIED,
};
pub use limits::CodecLimits;
pub use loss::{decode_loss_list, encode_loss_list, LossEntry, LossList};
pub use packet::{
    decode_srt_packet, decode_srt_packet_from, encode_srt_packet, ControlPacket, SrtPacket,
};
pub use wire::Limits as WireLimits;
