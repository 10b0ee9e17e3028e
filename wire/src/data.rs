//! Data packet header: sequence number and the packed message word.

use crate::error::{DecodeError, EncodeError, WireResult};
use crate::layout::{pack_field, KK, MSGNO, O, PP, R, TYPE_FIELD};
use crate::packet::{encode_packet, Packet, PacketKind};

/// Position of a packet within its message (the `PP` bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PacketPosition {
    /// `10`
    First,
    /// `00`
    Middle,
    /// `01`
    Last,
    /// `11`: the whole message fits in one packet.
    Solo,
}

impl PacketPosition {
    /// Maps the two `PP` bits to a position. Every combination is valid.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b10 => Self::First,
            0b00 => Self::Middle,
            0b01 => Self::Last,
            _ => Self::Solo,
        }
    }

    /// Returns the two `PP` bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::First => 0b10,
            Self::Middle => 0b00,
            Self::Last => 0b01,
            Self::Solo => 0b11,
        }
    }
}

/// Which stream encryption key protects the payload (the `KK` bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyFlag {
    /// Payload is not encrypted.
    None,
    Even,
    Odd,
}

impl KeyFlag {
    /// Maps the two `KK` bits of a data packet.
    ///
    /// `0b11` selects both keys, which only key material may do, so it has
    /// no data-packet meaning and yields `None`.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0b00 => Some(Self::None),
            0b01 => Some(Self::Even),
            0b10 => Some(Self::Odd),
            _ => None,
        }
    }

    /// Returns the two `KK` bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::None => 0b00,
            Self::Even => 0b01,
            Self::Odd => 0b10,
        }
    }
}

/// A decoded data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DataPacket<'a> {
    /// 31-bit packet sequence number.
    pub seq_number: u32,
    pub position: PacketPosition,
    /// Deliver in order (`O` bit).
    pub in_order: bool,
    pub key_flag: KeyFlag,
    /// Set on retransmitted copies (`R` bit).
    pub retransmitted: bool,
    /// 26-bit message number.
    pub message_number: u32,
    pub timestamp: u32,
    pub destination_id: u32,
    pub payload: &'a [u8],
}

impl<'a> DataPacket<'a> {
    /// Interprets an envelope as a data packet.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnexpectedPacketKind`] for control packets,
    /// [`DecodeError::InvalidKeyFlag`] when `KK` is `0b11`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_packet(packet: &Packet<'a>) -> WireResult<Self> {
        if packet.is_control {
            return Err(DecodeError::UnexpectedPacketKind {
                expected: PacketKind::Data,
            });
        }

        let word = packet.type_info;
        let kk = KK.extract(word);
        let key_flag =
            KeyFlag::from_bits(kk).ok_or(DecodeError::InvalidKeyFlag { value: kk as u8 })?;

        Ok(Self {
            seq_number: packet.type_field,
            position: PacketPosition::from_bits(PP.extract(word)),
            in_order: O.extract(word) == 1,
            key_flag,
            retransmitted: R.extract(word) == 1,
            message_number: MSGNO.extract(word),
            timestamp: packet.timestamp,
            destination_id: packet.destination_id,
            payload: packet.body,
        })
    }

    /// Lowers the data header into an envelope.
    ///
    /// # Errors
    ///
    /// [`EncodeError::FieldOverflow`] if the sequence number exceeds 31 bits
    /// or the message number exceeds 26 bits.
    pub fn to_packet(&self) -> Result<Packet<'a>, EncodeError> {
        if !TYPE_FIELD.fits(self.seq_number) {
            return Err(EncodeError::FieldOverflow {
                field: "sequence number",
                value: u64::from(self.seq_number),
                bits: TYPE_FIELD.width(),
            });
        }

        let word = pack_field(0, PP, self.position.bits(), "packet position")?;
        let word = pack_field(word, O, u32::from(self.in_order), "in-order flag")?;
        let word = pack_field(word, KK, self.key_flag.bits(), "key flag")?;
        let word = pack_field(word, R, u32::from(self.retransmitted), "retransmit flag")?;
        let word = pack_field(word, MSGNO, self.message_number, "message number")?;

        Ok(Packet {
            is_control: false,
            type_field: self.seq_number,
            type_info: word,
            timestamp: self.timestamp,
            destination_id: self.destination_id,
            body: self.payload,
        })
    }
}

/// Decodes the data header of an envelope. See [`DataPacket::from_packet`].
///
/// # Errors
///
/// Same as [`DataPacket::from_packet`].
pub fn decode_data_packet<'a>(packet: &Packet<'a>) -> WireResult<DataPacket<'a>> {
    DataPacket::from_packet(packet)
}

/// Encodes a data packet to bytes.
///
/// # Errors
///
/// Same as [`DataPacket::to_packet`].
pub fn encode_data_packet(data: &DataPacket<'_>) -> Result<Vec<u8>, EncodeError> {
    encode_packet(&data.to_packet()?)
}
