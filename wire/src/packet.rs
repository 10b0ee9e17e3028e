//! Packet envelope: the 16-byte header shared by both packet families.

use std::fmt;

use bitstream::{BitReader, BitWriter};

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::layout::{pack_field, F, TYPE_FIELD};
use crate::limits::Limits;

/// Size of the fixed packet header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Packet family selected by the F bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PacketKind {
    Data,
    Control,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::Control => write!(f, "control"),
        }
    }
}

/// A packet split into its header words and an unparsed body.
///
/// `type_field` is the 31 bits after the F bit: the sequence number of a data
/// packet, or control type and subtype of a control packet. `type_info` is
/// word 1, whose meaning depends on the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Packet<'a> {
    pub is_control: bool,
    pub type_field: u32,
    pub type_info: u32,
    pub timestamp: u32,
    pub destination_id: u32,
    pub body: &'a [u8],
}

impl Packet<'_> {
    /// Returns the packet family.
    #[must_use]
    pub const fn kind(&self) -> PacketKind {
        if self.is_control {
            PacketKind::Control
        } else {
            PacketKind::Data
        }
    }

    /// Destination socket id 0 is reserved for connection requests.
    #[must_use]
    pub const fn is_connection_request(&self) -> bool {
        self.destination_id == 0
    }

    /// Total encoded size in bytes.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }
}

/// Splits a datagram into header words and body.
///
/// # Errors
///
/// [`DecodeError::MalformedHeader`] if `buf` is shorter than [`HEADER_SIZE`],
/// [`DecodeError::LimitsExceeded`] if it is larger than the configured maximum.
pub fn decode_packet<'a>(buf: &'a [u8], limits: &Limits) -> WireResult<Packet<'a>> {
    if buf.len() < HEADER_SIZE {
        return Err(DecodeError::MalformedHeader {
            actual: buf.len(),
            required: HEADER_SIZE,
        });
    }
    if buf.len() > limits.max_packet_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::PacketBytes,
            limit: limits.max_packet_bytes,
            actual: buf.len(),
        });
    }

    let mut reader = BitReader::new(buf);
    let word0 = reader.read_u32_aligned()?;
    let type_info = reader.read_u32_aligned()?;
    let timestamp = reader.read_u32_aligned()?;
    let destination_id = reader.read_u32_aligned()?;
    let body = reader.read_rest()?;

    Ok(Packet {
        is_control: F.extract(word0) == 1,
        type_field: TYPE_FIELD.extract(word0),
        type_info,
        timestamp,
        destination_id,
        body,
    })
}

/// Encodes a packet, the exact inverse of [`decode_packet`].
///
/// # Errors
///
/// [`EncodeError::FieldOverflow`] if `type_field` does not fit in 31 bits.
pub fn encode_packet(packet: &Packet<'_>) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(packet.encoded_len());
    encode_packet_into(packet, &mut out)?;
    Ok(out)
}

/// Appends an encoded packet to `out`, returning the number of bytes written.
///
/// On error nothing is appended.
///
/// # Errors
///
/// Same as [`encode_packet`].
pub fn encode_packet_into(packet: &Packet<'_>, out: &mut Vec<u8>) -> Result<usize, EncodeError> {
    let word0 = pack_field(0, F, u32::from(packet.is_control), "F bit")?;
    let word0 = pack_field(word0, TYPE_FIELD, packet.type_field, "type field")?;

    let mut writer = BitWriter::with_capacity(packet.encoded_len());
    writer.write_u32_aligned(word0)?;
    writer.write_u32_aligned(packet.type_info)?;
    writer.write_u32_aligned(packet.timestamp)?;
    writer.write_u32_aligned(packet.destination_id)?;
    writer.write_bytes(packet.body)?;
    writer.finish_into(out);
    Ok(packet.encoded_len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(word0: u32, word1: u32, ts: u32, dst: u32) -> Vec<u8> {
        [word0, word1, ts, dst]
            .iter()
            .flat_map(|w| w.to_be_bytes())
            .collect()
    }

    #[test]
    fn decode_minimal_data_packet() {
        let buf = header_bytes(0x0000_0064, 0xC000_0001, 1234, 7);
        let packet = decode_packet(&buf, &Limits::default()).unwrap();
        assert!(!packet.is_control);
        assert_eq!(packet.kind(), PacketKind::Data);
        assert_eq!(packet.type_field, 100);
        assert_eq!(packet.type_info, 0xC000_0001);
        assert_eq!(packet.timestamp, 1234);
        assert_eq!(packet.destination_id, 7);
        assert!(packet.body.is_empty());
    }

    #[test]
    fn decode_control_packet_with_body() {
        let mut buf = header_bytes(0x8002_0000, 42, 0, 0);
        buf.extend_from_slice(&[1, 2, 3, 4]);
        let packet = decode_packet(&buf, &Limits::default()).unwrap();
        assert!(packet.is_control);
        assert_eq!(packet.type_field, 0x0002_0000);
        assert!(packet.is_connection_request());
        assert_eq!(packet.body, &[1, 2, 3, 4]);
    }

    #[test]
    fn decode_short_buffer() {
        let buf = [0u8; 15];
        let err = decode_packet(&buf, &Limits::default()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedHeader {
                actual: 15,
                required: HEADER_SIZE,
            }
        );
    }

    #[test]
    fn decode_empty_buffer() {
        assert!(matches!(
            decode_packet(&[], &Limits::default()),
            Err(DecodeError::MalformedHeader { actual: 0, .. })
        ));
    }

    #[test]
    fn decode_oversized_packet() {
        let buf = vec![0u8; Limits::for_testing().max_packet_bytes + 1];
        let err = decode_packet(&buf, &Limits::for_testing()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::LimitsExceeded {
                kind: LimitKind::PacketBytes,
                ..
            }
        ));
    }

    #[test]
    fn encode_is_byte_identical() {
        let mut buf = header_bytes(0x8006_0000, 9, 1_000_000, 0xDEAD_BEEF);
        buf.extend_from_slice(b"body");
        let packet = decode_packet(&buf, &Limits::default()).unwrap();
        assert_eq!(encode_packet(&packet).unwrap(), buf);
    }

    #[test]
    fn encode_rejects_wide_type_field() {
        let packet = Packet {
            is_control: false,
            type_field: 0x8000_0000,
            type_info: 0,
            timestamp: 0,
            destination_id: 0,
            body: &[],
        };
        let err = encode_packet(&packet).unwrap_err();
        assert!(matches!(err, EncodeError::FieldOverflow { bits: 31, .. }));
    }

    #[test]
    fn encode_into_appends() {
        let packet = Packet {
            is_control: true,
            type_field: 1 << 16,
            type_info: 0,
            timestamp: 5,
            destination_id: 6,
            body: &[],
        };
        let mut out = vec![0xAA];
        let written = encode_packet_into(&packet, &mut out).unwrap();
        assert_eq!(written, HEADER_SIZE);
        assert_eq!(out.len(), 1 + HEADER_SIZE);
        assert_eq!(out[0], 0xAA);
        assert_eq!(out[1], 0x80);
    }

    #[test]
    fn kind_display() {
        assert_eq!(PacketKind::Data.to_string(), "data");
        assert_eq!(PacketKind::Control.to_string(), "control");
    }
}
