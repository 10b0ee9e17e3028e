//! Handshake control information: 48 fixed bytes, then an extension chain.

use bitstream::{BitReader, BitWriter};
use wire::ControlType;

use crate::error::{CodecError, CodecResult};
use crate::extension::{decode_extension_chain, encode_extension_chain, ExtensionBlock};
use crate::limits::CodecLimits;

/// Size of the fixed part of a handshake CIF.
pub const HANDSHAKE_FIXED_SIZE: usize = 48;

/// Block cipher and key size advertised in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncryptionField {
    None,
    Aes128,
    Aes192,
    Aes256,
    Other(u16),
}

impl EncryptionField {
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::None,
            2 => Self::Aes128,
            3 => Self::Aes192,
            4 => Self::Aes256,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Aes128 => 2,
            Self::Aes192 => 3,
            Self::Aes256 => 4,
            Self::Other(raw) => raw,
        }
    }

    /// Stream key size in bytes, if the field names a known cipher.
    #[must_use]
    pub const fn key_bytes(self) -> Option<usize> {
        match self {
            Self::Aes128 => Some(16),
            Self::Aes192 => Some(24),
            Self::Aes256 => Some(32),
            Self::None | Self::Other(_) => None,
        }
    }
}

/// The handshake extension field.
///
/// In conclusion messages it flags which extension groups follow. In an
/// induction response it carries the SRT magic instead, so the raw value is
/// kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtensionFlags(u16);

impl ExtensionFlags {
    pub const HSREQ: u16 = 0x0001;
    pub const KMREQ: u16 = 0x0002;
    pub const CONFIG: u16 = 0x0004;
    /// Induction response magic.
    pub const SRT_MAGIC: u16 = 0x4A17;

    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    #[must_use]
    pub const fn with(self, flag: u16) -> Self {
        Self(self.0 | flag)
    }
}

/// Handshake message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HandshakeType {
    Done,
    Agreement,
    Conclusion,
    WaveHand,
    Induction,
    /// Rejection reasons and future types.
    Other(u32),
}

impl HandshakeType {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0xFFFF_FFFD => Self::Done,
            0xFFFF_FFFE => Self::Agreement,
            0xFFFF_FFFF => Self::Conclusion,
            0 => Self::WaveHand,
            1 => Self::Induction,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Done => 0xFFFF_FFFD,
            Self::Agreement => 0xFFFF_FFFE,
            Self::Conclusion => 0xFFFF_FFFF,
            Self::WaveHand => 0,
            Self::Induction => 1,
            Self::Other(raw) => raw,
        }
    }
}

/// A decoded handshake CIF.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Handshake {
    /// 4 for legacy peers, 5 for current ones.
    pub version: u32,
    pub encryption: EncryptionField,
    pub extension_flags: ExtensionFlags,
    pub initial_seq: u32,
    pub mtu: u32,
    /// Maximum packets in flight.
    pub flow_window: u32,
    pub handshake_type: HandshakeType,
    pub socket_id: u32,
    pub syn_cookie: u32,
    /// IPv4 uses the first word only.
    pub peer_ip: [u32; 4],
    pub extensions: Vec<ExtensionBlock>,
}

impl Handshake {
    /// Blocks of the given extension type, in wire order.
    pub fn blocks_of(&self, ext_type: u16) -> impl Iterator<Item = &ExtensionBlock> {
        self.extensions
            .iter()
            .filter(move |block| block.ext_type == ext_type)
    }
}

/// Decodes a handshake CIF.
pub fn decode_handshake(cif: &[u8], limits: &CodecLimits) -> CodecResult<Handshake> {
    if cif.len() < HANDSHAKE_FIXED_SIZE {
        return Err(CodecError::TruncatedCif {
            control_type: ControlType::Handshake,
            actual: cif.len(),
        });
    }

    let mut reader = BitReader::new(cif);
    let version = reader.read_u32_aligned()?;
    let encryption = EncryptionField::from_raw(reader.read_u16_aligned()?);
    let extension_flags = ExtensionFlags::from_raw(reader.read_u16_aligned()?);
    let initial_seq = reader.read_u32_aligned()?;
    let mtu = reader.read_u32_aligned()?;
    let flow_window = reader.read_u32_aligned()?;
    let handshake_type = HandshakeType::from_raw(reader.read_u32_aligned()?);
    let socket_id = reader.read_u32_aligned()?;
    let syn_cookie = reader.read_u32_aligned()?;
    let mut peer_ip = [0u32; 4];
    for word in &mut peer_ip {
        *word = reader.read_u32_aligned()?;
    }
    let extensions = decode_extension_chain(reader.read_rest()?, limits)?;

    Ok(Handshake {
        version,
        encryption,
        extension_flags,
        initial_seq,
        mtu,
        flow_window,
        handshake_type,
        socket_id,
        syn_cookie,
        peer_ip,
        extensions,
    })
}

/// Encodes a handshake CIF.
pub fn encode_handshake(hs: &Handshake) -> CodecResult<Vec<u8>> {
    let chain = encode_extension_chain(&hs.extensions)?;
    let mut writer = BitWriter::with_capacity(HANDSHAKE_FIXED_SIZE + chain.len());
    writer.write_u32_aligned(hs.version)?;
    writer.write_u16_aligned(hs.encryption.raw())?;
    writer.write_u16_aligned(hs.extension_flags.raw())?;
    writer.write_u32_aligned(hs.initial_seq)?;
    writer.write_u32_aligned(hs.mtu)?;
    writer.write_u32_aligned(hs.flow_window)?;
    writer.write_u32_aligned(hs.handshake_type.raw())?;
    writer.write_u32_aligned(hs.socket_id)?;
    writer.write_u32_aligned(hs.syn_cookie)?;
    for word in hs.peer_ip {
        writer.write_u32_aligned(word)?;
    }
    writer.write_bytes(&chain)?;
    Ok(writer.finish())
}
