//! Key material envelope carried by KMREQ/KMRSP extensions.
//!
//! ```text
//!  0                   1                   2                   3
//! |S|  V  |   PT  |              Sign             |   Resv1   | KK|
//! |                              KEKI                             |
//! |     Cipher    |      Auth     |       SE      |     Resv2     |
//! |             Resv3             |     SLen/4    |     KLen/4    |
//! |                              Salt                             |
//! |                              Wrap                             |
//! ```
//!
//! The wrap holds an 8-byte integrity check vector followed by one or two
//! wrapped stream keys. This layer frames those bytes; it never unwraps them.

use bitstream::{BitReader, BitWriter};

use crate::error::{CodecError, CodecResult};

/// Fixed header size in bytes.
pub const KM_HEADER_SIZE: usize = 16;
/// The `Sign` field: "HAI" as a PnP vendor id.
pub const KM_SIGN: u16 = 0x2029;
/// Size of the AES key wrap integrity check vector.
pub const ICV_SIZE: usize = 8;

pub const CIPHER_NONE: u8 = 0;
/// AES-CTR.
pub const CIPHER_AES_CTR: u8 = 2;
pub const AUTH_NONE: u8 = 0;
pub const SE_UNSPECIFIED: u8 = 0;
pub const SE_MPEG_TS_UDP: u8 = 1;
pub const SE_MPEG_TS_SRT: u8 = 2;

/// The `PT` nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KmPacketType {
    Reserved,
    /// Media stream message.
    MediaStream,
    /// Keying material message.
    KeyingMaterial,
    /// Reserved so an MPEG-TS sync byte (0x47) is never taken for key material.
    MpegTsReserved,
}

impl KmPacketType {
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Reserved),
            1 => Some(Self::MediaStream),
            2 => Some(Self::KeyingMaterial),
            7 => Some(Self::MpegTsReserved),
            _ => None,
        }
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            Self::Reserved => 0,
            Self::MediaStream => 1,
            Self::KeyingMaterial => 2,
            Self::MpegTsReserved => 7,
        }
    }
}

/// Which stream encrypting keys the wrap carries (the `KK` bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyFlags {
    Even,
    Odd,
    Both,
}

impl KeyFlags {
    /// Maps the `KK` bits. `0b00` (no key) has no envelope meaning.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b01 => Some(Self::Even),
            0b10 => Some(Self::Odd),
            0b11 => Some(Self::Both),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Even => 0b01,
            Self::Odd => 0b10,
            Self::Both => 0b11,
        }
    }

    /// Number of wrapped keys: the popcount of `KK`.
    #[must_use]
    pub const fn key_count(self) -> usize {
        self.bits().count_ones() as usize
    }
}

/// A decoded key material envelope.
///
/// `SLen/4` and `KLen/4` are not stored; they are derived from `salt` and
/// `wrap` so the lengths can never disagree with the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyMaterial {
    /// 3-bit version, 1 for current peers.
    pub version: u8,
    pub packet_type: KmPacketType,
    pub key_flags: KeyFlags,
    /// Key encrypting key index, 0 for the default key.
    pub keki: u32,
    pub cipher: u8,
    pub auth: u8,
    pub stream_encapsulation: u8,
    pub salt: Vec<u8>,
    /// ICV followed by the wrapped keys.
    pub wrap: Vec<u8>,
}

impl KeyMaterial {
    #[must_use]
    pub const fn key_count(&self) -> usize {
        self.key_flags.key_count()
    }

    /// Salt length in 32-bit words.
    #[must_use]
    pub fn salt_words(&self) -> usize {
        self.salt.len() / 4
    }

    /// Length of one wrapped key in bytes.
    #[must_use]
    pub fn key_len(&self) -> usize {
        self.wrap.len().saturating_sub(ICV_SIZE) / self.key_count()
    }

    /// Length of one wrapped key in 32-bit words.
    #[must_use]
    pub fn key_words(&self) -> usize {
        self.key_len() / 4
    }

    /// The integrity check vector at the start of the wrap.
    #[must_use]
    pub fn icv(&self) -> &[u8] {
        &self.wrap[..ICV_SIZE.min(self.wrap.len())]
    }

    /// The wrapped keys after the ICV, even key first when both are present.
    #[must_use]
    pub fn wrapped_keys(&self) -> &[u8] {
        &self.wrap[ICV_SIZE.min(self.wrap.len())..]
    }

    /// Encoded size in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        KM_HEADER_SIZE + self.salt.len() + self.wrap.len()
    }
}

/// Decodes a key material envelope. The buffer must hold exactly one envelope.
#[allow(clippy::cast_possible_truncation)]
pub fn decode_key_material(buf: &[u8]) -> CodecResult<KeyMaterial> {
    if buf.len() < KM_HEADER_SIZE {
        return Err(CodecError::TruncatedKeyMaterial {
            required: KM_HEADER_SIZE,
            actual: buf.len(),
        });
    }

    let mut reader = BitReader::new(buf);
    if reader.read_bit()? {
        return Err(CodecError::ReservedBitSet {
            field: "key material S bit",
        });
    }
    let version = reader.read_bits(3)? as u8;
    let raw_type = reader.read_bits(4)? as u8;
    let packet_type =
        KmPacketType::from_raw(raw_type).ok_or(CodecError::InvalidPacketType { value: raw_type })?;

    let sign = reader.read_u16_aligned()?;
    if sign != KM_SIGN {
        return Err(CodecError::BadSignature { found: sign });
    }

    let _resv1 = reader.read_bits(6)?;
    let kk = reader.read_bits(2)? as u8;
    let key_flags = KeyFlags::from_bits(kk).ok_or(CodecError::InvalidKeyFlag { value: kk })?;

    let keki = reader.read_u32_aligned()?;
    let cipher = reader.read_u8_aligned()?;
    let auth = reader.read_u8_aligned()?;
    let stream_encapsulation = reader.read_u8_aligned()?;
    let _resv2 = reader.read_u8_aligned()?;
    let _resv3 = reader.read_u16_aligned()?;
    let salt_len = usize::from(reader.read_u8_aligned()?) * 4;
    let key_len = usize::from(reader.read_u8_aligned()?) * 4;

    let required = KM_HEADER_SIZE + salt_len + key_flags.key_count() * key_len + ICV_SIZE;
    if buf.len() < required {
        return Err(CodecError::TruncatedKeyMaterial {
            required,
            actual: buf.len(),
        });
    }
    if buf.len() > required {
        return Err(CodecError::TrailingKeyMaterial {
            expected: required,
            actual: buf.len(),
        });
    }

    let salt = reader.read_bytes(salt_len)?.to_vec();
    let wrap = reader.read_rest()?.to_vec();

    Ok(KeyMaterial {
        version,
        packet_type,
        key_flags,
        keki,
        cipher,
        auth,
        stream_encapsulation,
        salt,
        wrap,
    })
}

/// Encodes a key material envelope, deriving `SLen/4` and `KLen/4`.
///
/// # Errors
///
/// `UnalignedLength` if the salt or a key is not a whole number of words,
/// `InvalidWrapLength` if the wrap cannot be split into an ICV and
/// `key_count` equal keys, `FieldOverflow` if the version or a word count is
/// too wide for its field.
pub fn encode_key_material(km: &KeyMaterial) -> CodecResult<Vec<u8>> {
    if km.version > 0b111 {
        return Err(CodecError::field_overflow(
            "key material version",
            u64::from(km.version),
            3,
        ));
    }
    let salt_words = word_count("salt", km.salt.len())?;

    let keys = km.key_count();
    let invalid_wrap = CodecError::InvalidWrapLength {
        len: km.wrap.len(),
        keys,
    };
    let key_bytes = km
        .wrap
        .len()
        .checked_sub(ICV_SIZE)
        .ok_or_else(|| invalid_wrap.clone())?;
    if key_bytes % keys != 0 {
        return Err(invalid_wrap);
    }
    let key_words = word_count("key", key_bytes / keys)?;

    let mut writer = BitWriter::with_capacity(km.encoded_len());
    writer.write_bool(false);
    writer.write_bits(u64::from(km.version), 3)?;
    writer.write_bits(u64::from(km.packet_type.raw()), 4)?;
    writer.write_u16_aligned(KM_SIGN)?;
    writer.write_bits(0, 6)?;
    writer.write_bits(u64::from(km.key_flags.bits()), 2)?;
    writer.write_u32_aligned(km.keki)?;
    writer.write_u8_aligned(km.cipher)?;
    writer.write_u8_aligned(km.auth)?;
    writer.write_u8_aligned(km.stream_encapsulation)?;
    writer.write_zeros(3)?;
    writer.write_u8_aligned(salt_words)?;
    writer.write_u8_aligned(key_words)?;
    writer.write_bytes(&km.salt)?;
    writer.write_bytes(&km.wrap)?;
    Ok(writer.finish())
}

fn word_count(field: &'static str, len: usize) -> CodecResult<u8> {
    if len % 4 != 0 {
        return Err(CodecError::UnalignedLength { field, len });
    }
    u8::try_from(len / 4).map_err(|_| CodecError::field_overflow(field, (len / 4) as u64, 8))
}
