//! Handshake extension blocks and their typed contents.
//!
//! A chain is a run of `{type: u16, length: u16 (words), contents}` blocks
//! filling the rest of a handshake CIF. [`decode_extension_chain`] only frames
//! blocks; [`Extension::from_block`] interprets the known types.

use bitstream::{BitReader, BitWriter};

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::keymat::{decode_key_material, encode_key_material, KeyMaterial};
use crate::limits::CodecLimits;

/// Size of a block header in bytes.
pub const EXTENSION_HEADER_SIZE: usize = 4;
/// Longest Stream ID a peer may send.
pub const STREAM_ID_MAX_BYTES: usize = 512;

/// Known extension types. Also used as user-defined control subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtensionType {
    HsReq,
    HsRsp,
    KmReq,
    KmRsp,
    StreamId,
    Congestion,
    Filter,
    Group,
}

impl ExtensionType {
    #[must_use]
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(Self::HsReq),
            2 => Some(Self::HsRsp),
            3 => Some(Self::KmReq),
            4 => Some(Self::KmRsp),
            5 => Some(Self::StreamId),
            6 => Some(Self::Congestion),
            7 => Some(Self::Filter),
            8 => Some(Self::Group),
            _ => None,
        }
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        match self {
            Self::HsReq => 1,
            Self::HsRsp => 2,
            Self::KmReq => 3,
            Self::KmRsp => 4,
            Self::StreamId => 5,
            Self::Congestion => 6,
            Self::Filter => 7,
            Self::Group => 8,
        }
    }
}

/// One framed extension block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtensionBlock {
    pub ext_type: u16,
    /// Contents length in 32-bit words.
    pub length_words: u16,
    /// Exactly `length_words * 4` bytes, zero padded.
    pub contents: Vec<u8>,
}

impl ExtensionBlock {
    /// Builds a block, zero padding `contents` to a whole number of words.
    pub fn new(ext_type: u16, mut contents: Vec<u8>) -> CodecResult<Self> {
        contents.resize(contents.len().next_multiple_of(4), 0);
        let words = contents.len() / 4;
        let length_words = u16::try_from(words)
            .map_err(|_| CodecError::field_overflow("extension length", words as u64, 16))?;
        Ok(Self {
            ext_type,
            length_words,
            contents,
        })
    }

    /// Encoded size in bytes, header included.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        EXTENSION_HEADER_SIZE + self.contents.len()
    }
}

/// Decodes an extension chain, consuming the whole buffer.
///
/// An empty buffer is an empty chain. Unknown types are kept as opaque blocks.
pub fn decode_extension_chain(
    buf: &[u8],
    limits: &CodecLimits,
) -> CodecResult<Vec<ExtensionBlock>> {
    let mut reader = BitReader::new(buf);
    let mut blocks = Vec::new();

    while !reader.is_empty() {
        let offset = reader.byte_position();
        if reader.bytes_remaining() < EXTENSION_HEADER_SIZE {
            return Err(CodecError::ExtensionOverrun {
                offset,
                declared: EXTENSION_HEADER_SIZE,
                available: reader.bytes_remaining(),
            });
        }
        if blocks.len() == limits.max_extension_blocks {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::ExtensionBlocks,
                limit: limits.max_extension_blocks,
                actual: blocks.len() + 1,
            });
        }

        let ext_type = reader.read_u16_aligned()?;
        let length_words = reader.read_u16_aligned()?;
        let declared = usize::from(length_words) * 4;
        let available = reader.bytes_remaining();
        if declared > available {
            return Err(CodecError::ExtensionOverrun {
                offset,
                declared: EXTENSION_HEADER_SIZE + declared,
                available: EXTENSION_HEADER_SIZE + available,
            });
        }

        blocks.push(ExtensionBlock {
            ext_type,
            length_words,
            contents: reader.read_bytes(declared)?.to_vec(),
        });
    }

    Ok(blocks)
}

/// Encodes blocks in the given order.
///
/// # Errors
///
/// `ExtensionLengthMismatch` if a block's contents are not exactly
/// `length_words * 4` bytes.
pub fn encode_extension_chain(blocks: &[ExtensionBlock]) -> CodecResult<Vec<u8>> {
    let total = blocks.iter().map(ExtensionBlock::encoded_len).sum();
    let mut writer = BitWriter::with_capacity(total);
    for block in blocks {
        if block.contents.len() != usize::from(block.length_words) * 4 {
            return Err(CodecError::ExtensionLengthMismatch {
                ext_type: block.ext_type,
                length_words: block.length_words,
                content_bytes: block.contents.len(),
            });
        }
        writer.write_u16_aligned(block.ext_type)?;
        writer.write_u16_aligned(block.length_words)?;
        writer.write_bytes(&block.contents)?;
    }
    Ok(writer.finish())
}

/// SRT capability flags exchanged in HSREQ/HSRSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SrtFlags(u32);

impl SrtFlags {
    pub const TSBPD_SND: u32 = 0x01;
    pub const TSBPD_RCV: u32 = 0x02;
    /// Legacy, always set: the peer understands the data `KK` bits.
    pub const CRYPT: u32 = 0x04;
    pub const TLPKTDROP: u32 = 0x08;
    pub const PERIODIC_NAK: u32 = 0x10;
    /// Legacy, always set: the peer understands the data `R` bit.
    pub const REXMIT_FLG: u32 = 0x20;
    /// Buffer mode instead of message mode.
    pub const STREAM: u32 = 0x40;
    pub const PACKET_FILTER: u32 = 0x80;

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    #[must_use]
    pub const fn with(self, flag: u32) -> Self {
        Self(self.0 | flag)
    }
}

/// HSREQ/HSRSP contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HsExtension {
    /// `major * 0x10000 + minor * 0x100 + patch`.
    pub srt_version: u32,
    pub flags: SrtFlags,
    /// Milliseconds.
    pub receiver_tsbpd_delay: u16,
    /// Milliseconds.
    pub sender_tsbpd_delay: u16,
}

impl HsExtension {
    pub const SIZE: usize = 12;

    /// Packs a library version number.
    #[must_use]
    pub fn version(major: u8, minor: u8, patch: u8) -> u32 {
        (u32::from(major) << 16) | (u32::from(minor) << 8) | u32::from(patch)
    }
}

/// Group type of a GROUP extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupType {
    Undefined,
    Broadcast,
    MainBackup,
    Balancing,
    Multicast,
    Other(u8),
}

impl GroupType {
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Undefined,
            1 => Self::Broadcast,
            2 => Self::MainBackup,
            3 => Self::Balancing,
            4 => Self::Multicast,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::Broadcast => 1,
            Self::MainBackup => 2,
            Self::Balancing => 3,
            Self::Multicast => 4,
            Self::Other(raw) => raw,
        }
    }
}

/// GROUP contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupMembership {
    pub group_id: u32,
    pub group_type: GroupType,
    pub flags: u8,
    /// Link priority for main/backup groups.
    pub weight: u16,
}

impl GroupMembership {
    pub const SIZE: usize = 8;
    /// `M` flag: synchronize on message numbers instead of sequence numbers.
    pub const FLAG_MSG_SYNC: u8 = 0x01;

    #[must_use]
    pub const fn syncs_on_message(&self) -> bool {
        self.flags & Self::FLAG_MSG_SYNC != 0
    }
}

/// Typed extension contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Extension {
    HsReq(HsExtension),
    HsRsp(HsExtension),
    KmReq(KeyMaterial),
    KmRsp(KeyMaterial),
    /// KMRSP carrying a single key material state word instead of an envelope.
    KmRspState(u32),
    StreamId(String),
    Congestion(String),
    Filter(String),
    Group(GroupMembership),
    Unknown(ExtensionBlock),
}

impl Extension {
    /// Raw extension type.
    #[must_use]
    pub const fn ext_type(&self) -> u16 {
        match self {
            Self::HsReq(_) => ExtensionType::HsReq.raw(),
            Self::HsRsp(_) => ExtensionType::HsRsp.raw(),
            Self::KmReq(_) => ExtensionType::KmReq.raw(),
            Self::KmRsp(_) | Self::KmRspState(_) => ExtensionType::KmRsp.raw(),
            Self::StreamId(_) => ExtensionType::StreamId.raw(),
            Self::Congestion(_) => ExtensionType::Congestion.raw(),
            Self::Filter(_) => ExtensionType::Filter.raw(),
            Self::Group(_) => ExtensionType::Group.raw(),
            Self::Unknown(block) => block.ext_type,
        }
    }

    /// Key material carried by KMREQ or KMRSP, if any.
    #[must_use]
    pub const fn key_material(&self) -> Option<&KeyMaterial> {
        match self {
            Self::KmReq(km) | Self::KmRsp(km) => Some(km),
            _ => None,
        }
    }

    /// Interprets a framed block.
    pub fn from_block(block: &ExtensionBlock, limits: &CodecLimits) -> CodecResult<Self> {
        match ExtensionType::from_raw(block.ext_type) {
            Some(ext_type) => Self::decode(ext_type, &block.contents, limits),
            None => Ok(Self::Unknown(block.clone())),
        }
    }

    /// Interprets the contents of a known extension type.
    pub fn decode(
        ext_type: ExtensionType,
        contents: &[u8],
        limits: &CodecLimits,
    ) -> CodecResult<Self> {
        Ok(match ext_type {
            ExtensionType::HsReq => Self::HsReq(decode_hs(ext_type, contents)?),
            ExtensionType::HsRsp => Self::HsRsp(decode_hs(ext_type, contents)?),
            ExtensionType::KmReq => Self::KmReq(decode_key_material(contents)?),
            ExtensionType::KmRsp if contents.len() == 4 => {
                Self::KmRspState(BitReader::new(contents).read_u32_aligned()?)
            }
            ExtensionType::KmRsp => Self::KmRsp(decode_key_material(contents)?),
            ExtensionType::StreamId => {
                let value = decode_string(ext_type, contents)?;
                let limit = limits.max_stream_id_bytes.min(STREAM_ID_MAX_BYTES);
                if value.len() > limit {
                    return Err(CodecError::LimitsExceeded {
                        kind: LimitKind::StreamIdBytes,
                        limit,
                        actual: value.len(),
                    });
                }
                Self::StreamId(value)
            }
            ExtensionType::Congestion => Self::Congestion(decode_string(ext_type, contents)?),
            ExtensionType::Filter => Self::Filter(decode_string(ext_type, contents)?),
            ExtensionType::Group => Self::Group(decode_group(contents)?),
        })
    }

    /// Encodes the contents, without a block header.
    pub fn encode_contents(&self) -> CodecResult<Vec<u8>> {
        match self {
            Self::HsReq(hs) | Self::HsRsp(hs) => {
                let mut writer = BitWriter::with_capacity(HsExtension::SIZE);
                writer.write_u32_aligned(hs.srt_version)?;
                writer.write_u32_aligned(hs.flags.raw())?;
                writer.write_u16_aligned(hs.receiver_tsbpd_delay)?;
                writer.write_u16_aligned(hs.sender_tsbpd_delay)?;
                Ok(writer.finish())
            }
            Self::KmReq(km) | Self::KmRsp(km) => encode_key_material(km),
            Self::KmRspState(state) => Ok(state.to_be_bytes().to_vec()),
            Self::StreamId(value) => {
                if value.len() > STREAM_ID_MAX_BYTES {
                    return Err(CodecError::LimitsExceeded {
                        kind: LimitKind::StreamIdBytes,
                        limit: STREAM_ID_MAX_BYTES,
                        actual: value.len(),
                    });
                }
                encode_string(ExtensionType::StreamId, value)
            }
            Self::Congestion(value) => encode_string(ExtensionType::Congestion, value),
            Self::Filter(value) => encode_string(ExtensionType::Filter, value),
            Self::Group(group) => {
                let mut writer = BitWriter::with_capacity(GroupMembership::SIZE);
                writer.write_u32_aligned(group.group_id)?;
                writer.write_u8_aligned(group.group_type.raw())?;
                writer.write_u8_aligned(group.flags)?;
                writer.write_u16_aligned(group.weight)?;
                Ok(writer.finish())
            }
            Self::Unknown(block) => Ok(block.contents.clone()),
        }
    }

    /// Frames the extension as a block.
    pub fn to_block(&self) -> CodecResult<ExtensionBlock> {
        if let Self::Unknown(block) = self {
            return Ok(block.clone());
        }
        ExtensionBlock::new(self.ext_type(), self.encode_contents()?)
    }
}

fn decode_hs(ext_type: ExtensionType, contents: &[u8]) -> CodecResult<HsExtension> {
    expect_size(ext_type, contents, HsExtension::SIZE)?;
    let mut reader = BitReader::new(contents);
    Ok(HsExtension {
        srt_version: reader.read_u32_aligned()?,
        flags: SrtFlags::from_raw(reader.read_u32_aligned()?),
        receiver_tsbpd_delay: reader.read_u16_aligned()?,
        sender_tsbpd_delay: reader.read_u16_aligned()?,
    })
}

fn decode_group(contents: &[u8]) -> CodecResult<GroupMembership> {
    expect_size(ExtensionType::Group, contents, GroupMembership::SIZE)?;
    let mut reader = BitReader::new(contents);
    Ok(GroupMembership {
        group_id: reader.read_u32_aligned()?,
        group_type: GroupType::from_raw(reader.read_u8_aligned()?),
        flags: reader.read_u8_aligned()?,
        weight: reader.read_u16_aligned()?,
    })
}

fn expect_size(ext_type: ExtensionType, contents: &[u8], size: usize) -> CodecResult<()> {
    if contents.len() != size {
        return Err(CodecError::TruncatedExtension {
            ext_type: ext_type.raw(),
            expected: size,
            actual: contents.len(),
        });
    }
    Ok(())
}

/// String extensions are sent as little-endian 32-bit words: each group of
/// four bytes is reversed, then the tail is zero padded.
fn decode_string(ext_type: ExtensionType, contents: &[u8]) -> CodecResult<String> {
    if contents.len() % 4 != 0 {
        return Err(CodecError::UnalignedLength {
            field: "string extension",
            len: contents.len(),
        });
    }
    let mut bytes: Vec<u8> = contents
        .chunks_exact(4)
        .flat_map(|word| word.iter().rev().copied())
        .collect();
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidString {
        ext_type: ext_type.raw(),
    })
}

/// A trailing NUL would be indistinguishable from padding.
fn encode_string(ext_type: ExtensionType, value: &str) -> CodecResult<Vec<u8>> {
    if value.ends_with('\0') {
        return Err(CodecError::InvalidString {
            ext_type: ext_type.raw(),
        });
    }
    let mut bytes = value.as_bytes().to_vec();
    bytes.resize(bytes.len().next_multiple_of(4), 0);
    for word in bytes.chunks_exact_mut(4) {
        word.reverse();
    }
    Ok(bytes)
}
