//! ACK control information: three layouts told apart only by length.

use bitstream::{BitReader, BitWriter};
use wire::ControlType;

use crate::error::{CodecError, CodecResult};

/// Body of an ACK packet. The ACK number travels in the type-specific info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ack {
    /// Sent every few packets at high rates.
    Light { last_ack_seq: u32 },
    Small {
        last_ack_seq: u32,
        /// Microseconds.
        rtt: u32,
        /// Microseconds.
        rtt_variance: u32,
        /// Packets.
        available_buffer: u32,
    },
    Full {
        last_ack_seq: u32,
        rtt: u32,
        rtt_variance: u32,
        available_buffer: u32,
        /// Packets per second.
        packets_receiving_rate: u32,
        /// Packets per second.
        estimated_link_capacity: u32,
        /// Bytes per second.
        receiving_rate: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AckLayout {
    Light,
    Small,
    Full,
}

/// CIF length in bytes for each layout. Lengths must match exactly.
const ACK_LAYOUTS: [(usize, AckLayout); 3] = [
    (4, AckLayout::Light),
    (16, AckLayout::Small),
    (28, AckLayout::Full),
];

fn layout_for_len(len: usize) -> Option<AckLayout> {
    ACK_LAYOUTS
        .iter()
        .find(|(size, _)| *size == len)
        .map(|(_, layout)| *layout)
}

impl Ack {
    /// Last acknowledged sequence number plus one. Present in every layout.
    #[must_use]
    pub const fn last_ack_seq(&self) -> u32 {
        match *self {
            Self::Light { last_ack_seq }
            | Self::Small { last_ack_seq, .. }
            | Self::Full { last_ack_seq, .. } => last_ack_seq,
        }
    }

    /// Encoded CIF length in bytes.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        match self {
            Self::Light { .. } => 4,
            Self::Small { .. } => 16,
            Self::Full { .. } => 28,
        }
    }

    fn words(&self) -> Vec<u32> {
        match *self {
            Self::Light { last_ack_seq } => vec![last_ack_seq],
            Self::Small {
                last_ack_seq,
                rtt,
                rtt_variance,
                available_buffer,
            } => vec![last_ack_seq, rtt, rtt_variance, available_buffer],
            Self::Full {
                last_ack_seq,
                rtt,
                rtt_variance,
                available_buffer,
                packets_receiving_rate,
                estimated_link_capacity,
                receiving_rate,
            } => vec![
                last_ack_seq,
                rtt,
                rtt_variance,
                available_buffer,
                packets_receiving_rate,
                estimated_link_capacity,
                receiving_rate,
            ],
        }
    }
}

/// Decodes an ACK CIF, selecting the layout from its exact length.
pub fn decode_ack(cif: &[u8]) -> CodecResult<Ack> {
    let layout = layout_for_len(cif.len()).ok_or(CodecError::TruncatedCif {
        control_type: ControlType::Ack,
        actual: cif.len(),
    })?;

    let mut reader = BitReader::new(cif);
    let last_ack_seq = reader.read_u32_aligned()?;
    if layout == AckLayout::Light {
        return Ok(Ack::Light { last_ack_seq });
    }

    let rtt = reader.read_u32_aligned()?;
    let rtt_variance = reader.read_u32_aligned()?;
    let available_buffer = reader.read_u32_aligned()?;
    if layout == AckLayout::Small {
        return Ok(Ack::Small {
            last_ack_seq,
            rtt,
            rtt_variance,
            available_buffer,
        });
    }

    Ok(Ack::Full {
        last_ack_seq,
        rtt,
        rtt_variance,
        available_buffer,
        packets_receiving_rate: reader.read_u32_aligned()?,
        estimated_link_capacity: reader.read_u32_aligned()?,
        receiving_rate: reader.read_u32_aligned()?,
    })
}

/// Encodes an ACK CIF.
pub fn encode_ack(ack: &Ack) -> CodecResult<Vec<u8>> {
    let mut writer = BitWriter::with_capacity(ack.encoded_len());
    for word in ack.words() {
        writer.write_u32_aligned(word)?;
    }
    Ok(writer.finish())
}
