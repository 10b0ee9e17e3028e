//! Fully typed packets: envelope, header and CIF in one call.

use wire::{decode_packet, encode_packet, ControlHeader, DataPacket, Limits, Packet};

use crate::cif::{decode_control_cif, encode_control_cif, Cif};
use crate::error::CodecResult;
use crate::limits::CodecLimits;

/// A control packet with its CIF decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlPacket {
    pub timestamp: u32,
    pub destination_id: u32,
    pub cif: Cif,
}

/// A decoded SRT packet. Data payloads borrow from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SrtPacket<'a> {
    Data(DataPacket<'a>),
    Control(ControlPacket),
}

impl SrtPacket<'_> {
    #[must_use]
    pub const fn timestamp(&self) -> u32 {
        match self {
            Self::Data(data) => data.timestamp,
            Self::Control(control) => control.timestamp,
        }
    }

    #[must_use]
    pub const fn destination_id(&self) -> u32 {
        match self {
            Self::Data(data) => data.destination_id,
            Self::Control(control) => control.destination_id,
        }
    }
}

/// Decodes a datagram into a typed packet.
pub fn decode_srt_packet<'a>(
    buf: &'a [u8],
    limits: &Limits,
    codec_limits: &CodecLimits,
) -> CodecResult<SrtPacket<'a>> {
    let packet = decode_packet(buf, limits)?;
    decode_srt_packet_from(&packet, codec_limits)
}

/// Types an already split envelope.
pub fn decode_srt_packet_from<'a>(
    packet: &Packet<'a>,
    codec_limits: &CodecLimits,
) -> CodecResult<SrtPacket<'a>> {
    if !packet.is_control {
        return Ok(SrtPacket::Data(DataPacket::from_packet(packet)?));
    }
    let header = ControlHeader::from_packet(packet)?;
    Ok(SrtPacket::Control(ControlPacket {
        timestamp: header.timestamp,
        destination_id: header.destination_id,
        cif: decode_control_cif(&header, codec_limits)?,
    }))
}

/// Encodes a typed packet to bytes.
pub fn encode_srt_packet(packet: &SrtPacket<'_>) -> CodecResult<Vec<u8>> {
    match packet {
        SrtPacket::Data(data) => Ok(encode_packet(&data.to_packet()?)?),
        SrtPacket::Control(control) => {
            let body = encode_control_cif(&control.cif)?;
            let header = ControlHeader {
                control_type: control.cif.control_type(),
                subtype: control.cif.subtype(),
                type_specific_info: control.cif.type_specific_info(),
                timestamp: control.timestamp,
                destination_id: control.destination_id,
                cif: &body,
            };
            Ok(encode_packet(&header.to_packet()?)?)
        }
    }
}
