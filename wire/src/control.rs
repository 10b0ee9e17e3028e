//! Control packet header: control type, subtype and type-specific info.

use std::fmt;

use crate::error::{DecodeError, EncodeError, WireResult};
use crate::layout::{pack_field, CONTROL_TYPE, SUBTYPE};
use crate::packet::{encode_packet, Packet, PacketKind};

/// Control packet types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlType {
    Handshake,
    KeepAlive,
    Ack,
    Nak,
    CongestionWarning,
    Shutdown,
    AckAck,
    DropRequest,
    PeerError,
    /// `0x7FFF`: the subtype selects the message.
    UserDefined,
    /// Any other 15-bit value, kept verbatim.
    Unknown(u16),
}

impl ControlType {
    /// Raw value of [`ControlType::UserDefined`].
    pub const USER_DEFINED: u16 = 0x7FFF;

    /// Maps a raw 15-bit control type.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::Handshake,
            1 => Self::KeepAlive,
            2 => Self::Ack,
            3 => Self::Nak,
            4 => Self::CongestionWarning,
            5 => Self::Shutdown,
            6 => Self::AckAck,
            7 => Self::DropRequest,
            8 => Self::PeerError,
            Self::USER_DEFINED => Self::UserDefined,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw control type.
    #[must_use]
    pub const fn raw(self) -> u16 {
        match self {
            Self::Handshake => 0,
            Self::KeepAlive => 1,
            Self::Ack => 2,
            Self::Nak => 3,
            Self::CongestionWarning => 4,
            Self::Shutdown => 5,
            Self::AckAck => 6,
            Self::DropRequest => 7,
            Self::PeerError => 8,
            Self::UserDefined => Self::USER_DEFINED,
            Self::Unknown(raw) => raw,
        }
    }

    /// `false` for an `Unknown` value that names one of the known types.
    #[must_use]
    pub const fn is_canonical(self) -> bool {
        match self {
            Self::Unknown(raw) => matches!(Self::from_raw(raw), Self::Unknown(_)),
            _ => true,
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake => write!(f, "handshake"),
            Self::KeepAlive => write!(f, "keepalive"),
            Self::Ack => write!(f, "ack"),
            Self::Nak => write!(f, "nak"),
            Self::CongestionWarning => write!(f, "congestion warning"),
            Self::Shutdown => write!(f, "shutdown"),
            Self::AckAck => write!(f, "ackack"),
            Self::DropRequest => write!(f, "drop request"),
            Self::PeerError => write!(f, "peer error"),
            Self::UserDefined => write!(f, "user defined"),
            Self::Unknown(raw) => write!(f, "unknown (0x{raw:04x})"),
        }
    }
}

/// A control packet header with its CIF left unparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ControlHeader<'a> {
    pub control_type: ControlType,
    pub subtype: u16,
    /// Word 1. Ack number, message number or error code depending on type.
    pub type_specific_info: u32,
    pub timestamp: u32,
    pub destination_id: u32,
    /// Control information field.
    pub cif: &'a [u8],
}

impl<'a> ControlHeader<'a> {
    /// Interprets an envelope as a control packet.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnexpectedPacketKind`] for data packets.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_packet(packet: &Packet<'a>) -> WireResult<Self> {
        if !packet.is_control {
            return Err(DecodeError::UnexpectedPacketKind {
                expected: PacketKind::Control,
            });
        }

        // type_field holds the 31 bits after F; realign to word 0
        let word0 = packet.type_field;
        let control_type = (word0 >> SUBTYPE.width()) as u16;
        let subtype = SUBTYPE.extract(word0) as u16;

        Ok(Self {
            control_type: ControlType::from_raw(control_type),
            subtype,
            type_specific_info: packet.type_info,
            timestamp: packet.timestamp,
            destination_id: packet.destination_id,
            cif: packet.body,
        })
    }

    /// Lowers the control header into an envelope.
    ///
    /// # Errors
    ///
    /// [`EncodeError::FieldOverflow`] if an `Unknown` control type does not
    /// fit in 15 bits, [`EncodeError::NonCanonicalControlType`] if it spells
    /// a known type.
    pub fn to_packet(&self) -> Result<Packet<'a>, EncodeError> {
        if !self.control_type.is_canonical() {
            return Err(EncodeError::NonCanonicalControlType {
                raw: self.control_type.raw(),
            });
        }
        let word0 = pack_field(
            0,
            CONTROL_TYPE,
            u32::from(self.control_type.raw()),
            "control type",
        )?;
        let word0 = pack_field(word0, SUBTYPE, u32::from(self.subtype), "subtype")?;

        Ok(Packet {
            is_control: true,
            type_field: word0,
            type_info: self.type_specific_info,
            timestamp: self.timestamp,
            destination_id: self.destination_id,
            body: self.cif,
        })
    }
}

/// Decodes the control header of an envelope. See [`ControlHeader::from_packet`].
///
/// # Errors
///
/// Same as [`ControlHeader::from_packet`].
pub fn decode_control_header<'a>(packet: &Packet<'a>) -> WireResult<ControlHeader<'a>> {
    ControlHeader::from_packet(packet)
}

/// Encodes a control header and its raw CIF to bytes.
///
/// # Errors
///
/// Same as [`ControlHeader::to_packet`].
pub fn encode_control_header(header: &ControlHeader<'_>) -> Result<Vec<u8>, EncodeError> {
    encode_packet(&header.to_packet()?)
}
