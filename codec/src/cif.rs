//! Control information field dispatch by control type.

use bitstream::{BitReader, BitWriter};
use wire::{ControlHeader, ControlType};

use crate::ack::{decode_ack, encode_ack, Ack};
use crate::error::{CodecError, CodecResult};
use crate::extension::{Extension, ExtensionType};
use crate::handshake::{decode_handshake, encode_handshake, Handshake};
use crate::limits::CodecLimits;
use crate::loss::{decode_loss_list, encode_loss_list, LossList};

/// Peer error code for a file system error on the peer.
pub const PEER_ERROR_FILE_SYSTEM: u32 = 4000;

/// Size of a drop request CIF.
const DROP_REQUEST_SIZE: usize = 8;

/// A typed control information field, with the header words it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cif {
    Handshake(Handshake),
    KeepAlive,
    Ack { ack_number: u32, ack: Ack },
    Nak(LossList),
    CongestionWarning,
    Shutdown,
    AckAck { ack_number: u32 },
    DropRequest {
        message_number: u32,
        first_seq: u32,
        last_seq: u32,
    },
    PeerError { code: u32 },
    /// User-defined control packet whose subtype is a known extension type.
    UserDefined(Extension),
    /// Unknown control type or user-defined subtype, kept verbatim.
    Raw {
        control_type: u16,
        subtype: u16,
        type_specific_info: u32,
        payload: Vec<u8>,
    },
}

impl Cif {
    /// Control type of the header carrying this CIF.
    #[must_use]
    pub const fn control_type(&self) -> ControlType {
        match self {
            Self::Handshake(_) => ControlType::Handshake,
            Self::KeepAlive => ControlType::KeepAlive,
            Self::Ack { .. } => ControlType::Ack,
            Self::Nak(_) => ControlType::Nak,
            Self::CongestionWarning => ControlType::CongestionWarning,
            Self::Shutdown => ControlType::Shutdown,
            Self::AckAck { .. } => ControlType::AckAck,
            Self::DropRequest { .. } => ControlType::DropRequest,
            Self::PeerError { .. } => ControlType::PeerError,
            Self::UserDefined(_) => ControlType::UserDefined,
            Self::Raw { control_type, .. } => ControlType::from_raw(*control_type),
        }
    }

    /// Subtype of the header carrying this CIF.
    #[must_use]
    pub const fn subtype(&self) -> u16 {
        match self {
            Self::UserDefined(ext) => ext.ext_type(),
            Self::Raw { subtype, .. } => *subtype,
            _ => 0,
        }
    }

    /// Type-specific info word of the header carrying this CIF.
    #[must_use]
    pub const fn type_specific_info(&self) -> u32 {
        match self {
            Self::Ack { ack_number, .. } | Self::AckAck { ack_number } => *ack_number,
            Self::DropRequest { message_number, .. } => *message_number,
            Self::PeerError { code } => *code,
            Self::Raw {
                type_specific_info, ..
            } => *type_specific_info,
            _ => 0,
        }
    }
}

/// Decodes the CIF of a control header.
///
/// Unknown control types and unknown user-defined subtypes decode to
/// [`Cif::Raw`]. Types without a CIF ignore any bytes present.
pub fn decode_control_cif(header: &ControlHeader<'_>, limits: &CodecLimits) -> CodecResult<Cif> {
    let cif = header.cif;
    let info = header.type_specific_info;
    Ok(match header.control_type {
        ControlType::Handshake => Cif::Handshake(decode_handshake(cif, limits)?),
        ControlType::KeepAlive => Cif::KeepAlive,
        ControlType::Ack => Cif::Ack {
            ack_number: info,
            ack: decode_ack(cif)?,
        },
        ControlType::Nak => Cif::Nak(decode_loss_list(cif, limits)?),
        ControlType::CongestionWarning => Cif::CongestionWarning,
        ControlType::Shutdown => Cif::Shutdown,
        ControlType::AckAck => Cif::AckAck { ack_number: info },
        ControlType::DropRequest => {
            if cif.len() < DROP_REQUEST_SIZE {
                return Err(CodecError::TruncatedCif {
                    control_type: ControlType::DropRequest,
                    actual: cif.len(),
                });
            }
            let mut reader = BitReader::new(cif);
            Cif::DropRequest {
                message_number: info,
                first_seq: reader.read_u32_aligned()?,
                last_seq: reader.read_u32_aligned()?,
            }
        }
        ControlType::PeerError => Cif::PeerError { code: info },
        ControlType::UserDefined => match ExtensionType::from_raw(header.subtype) {
            Some(ext_type) => Cif::UserDefined(Extension::decode(ext_type, cif, limits)?),
            None => raw(header),
        },
        ControlType::Unknown(_) => raw(header),
    })
}

fn raw(header: &ControlHeader<'_>) -> Cif {
    Cif::Raw {
        control_type: header.control_type.raw(),
        subtype: header.subtype,
        type_specific_info: header.type_specific_info,
        payload: header.cif.to_vec(),
    }
}

/// Encodes the CIF bytes. Header words come from [`Cif::control_type`],
/// [`Cif::subtype`] and [`Cif::type_specific_info`].
///
/// A `Raw` CIF for a known control type or extension subtype, and a
/// `UserDefined` CIF holding an unknown extension, are rejected: they would
/// decode as a different variant.
pub fn encode_control_cif(cif: &Cif) -> CodecResult<Vec<u8>> {
    if !is_canonical(cif) {
        return Err(CodecError::NonCanonicalCif {
            control_type: cif.control_type().raw(),
            subtype: cif.subtype(),
        });
    }
    match cif {
        Cif::Handshake(hs) => encode_handshake(hs),
        Cif::KeepAlive
        | Cif::CongestionWarning
        | Cif::Shutdown
        | Cif::AckAck { .. }
        | Cif::PeerError { .. } => Ok(Vec::new()),
        Cif::Ack { ack, .. } => encode_ack(ack),
        Cif::Nak(list) => encode_loss_list(list),
        Cif::DropRequest {
            first_seq,
            last_seq,
            ..
        } => {
            let mut writer = BitWriter::with_capacity(DROP_REQUEST_SIZE);
            writer.write_u32_aligned(*first_seq)?;
            writer.write_u32_aligned(*last_seq)?;
            Ok(writer.finish())
        }
        Cif::UserDefined(ext) => ext.encode_contents(),
        Cif::Raw { payload, .. } => Ok(payload.clone()),
    }
}

fn is_canonical(cif: &Cif) -> bool {
    match cif {
        Cif::UserDefined(Extension::Unknown(_)) => false,
        Cif::Raw {
            control_type,
            subtype,
            ..
        } => match ControlType::from_raw(*control_type) {
            ControlType::Unknown(_) => true,
            ControlType::UserDefined => ExtensionType::from_raw(*subtype).is_none(),
            _ => false,
        },
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{ExtensionBlock, HsExtension};

    fn header(control_type: ControlType, subtype: u16, info: u32, cif: &[u8]) -> ControlHeader<'_> {
        ControlHeader {
            control_type,
            subtype,
            type_specific_info: info,
            timestamp: 0,
            destination_id: 0,
            cif,
        }
    }

    fn decode(header: &ControlHeader<'_>) -> CodecResult<Cif> {
        decode_control_cif(header, &CodecLimits::default())
    }

    #[test]
    fn empty_types_ignore_trailing_bytes() {
        for (control_type, expected) in [
            (ControlType::KeepAlive, Cif::KeepAlive),
            (ControlType::CongestionWarning, Cif::CongestionWarning),
            (ControlType::Shutdown, Cif::Shutdown),
            (ControlType::AckAck, Cif::AckAck { ack_number: 3 }),
        ] {
            let cif = decode(&header(control_type, 0, 3, &[1, 2, 3, 4])).unwrap();
            assert_eq!(cif, expected);
            assert!(encode_control_cif(&cif).unwrap().is_empty());
        }
    }

    #[test]
    fn ack_number_comes_from_header() {
        let cif = decode(&header(ControlType::Ack, 0, 42, &9u32.to_be_bytes())).unwrap();
        assert_eq!(
            cif,
            Cif::Ack {
                ack_number: 42,
                ack: Ack::Light { last_ack_seq: 9 },
            }
        );
        assert_eq!(cif.type_specific_info(), 42);
    }

    #[test]
    fn drop_request() {
        let mut body = 10u32.to_be_bytes().to_vec();
        body.extend_from_slice(&20u32.to_be_bytes());
        let cif = decode(&header(ControlType::DropRequest, 0, 7, &body)).unwrap();
        assert_eq!(
            cif,
            Cif::DropRequest {
                message_number: 7,
                first_seq: 10,
                last_seq: 20,
            }
        );
        assert_eq!(encode_control_cif(&cif).unwrap(), body);

        assert_eq!(
            decode(&header(ControlType::DropRequest, 0, 7, &body[..6])).unwrap_err(),
            CodecError::TruncatedCif {
                control_type: ControlType::DropRequest,
                actual: 6,
            }
        );
    }

    #[test]
    fn peer_error_code() {
        let cif = decode(&header(ControlType::PeerError, 0, PEER_ERROR_FILE_SYSTEM, &[])).unwrap();
        assert_eq!(cif, Cif::PeerError { code: 4000 });
        assert_eq!(cif.control_type(), ControlType::PeerError);
    }

    #[test]
    fn unknown_type_is_raw() {
        let cif = decode(&header(ControlType::Unknown(0x99), 3, 5, b"xyz")).unwrap();
        assert_eq!(
            cif,
            Cif::Raw {
                control_type: 0x99,
                subtype: 3,
                type_specific_info: 5,
                payload: b"xyz".to_vec(),
            }
        );
        assert_eq!(cif.control_type(), ControlType::Unknown(0x99));
        assert_eq!(cif.subtype(), 3);
        assert_eq!(encode_control_cif(&cif).unwrap(), b"xyz");
    }

    #[test]
    fn user_defined_dispatches_on_subtype() {
        let hs = HsExtension {
            srt_version: 0x0001_0400,
            flags: crate::extension::SrtFlags::from_raw(0x3F),
            receiver_tsbpd_delay: 120,
            sender_tsbpd_delay: 120,
        };
        let contents = Extension::HsReq(hs).encode_contents().unwrap();
        let cif = decode(&header(ControlType::UserDefined, 1, 0, &contents)).unwrap();
        assert_eq!(cif, Cif::UserDefined(Extension::HsReq(hs)));
        assert_eq!(cif.subtype(), 1);
        assert_eq!(cif.control_type(), ControlType::UserDefined);

        let unknown = decode(&header(ControlType::UserDefined, 9, 0, b"ab")).unwrap();
        assert!(matches!(unknown, Cif::Raw { control_type: 0x7FFF, subtype: 9, .. }));
    }

    #[test]
    fn handshake_too_short() {
        assert!(matches!(
            decode(&header(ControlType::Handshake, 0, 0, &[0; 20])),
            Err(CodecError::TruncatedCif {
                control_type: ControlType::Handshake,
                actual: 20,
            })
        ));
    }

    #[test]
    fn non_canonical_cifs_rejected() {
        let block = ExtensionBlock::new(42, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(
            encode_control_cif(&Cif::UserDefined(Extension::Unknown(block))).unwrap_err(),
            CodecError::NonCanonicalCif {
                control_type: 0x7FFF,
                subtype: 42,
            }
        );

        let raw = |control_type, subtype| Cif::Raw {
            control_type,
            subtype,
            type_specific_info: 0,
            payload: Vec::new(),
        };
        assert!(matches!(
            encode_control_cif(&raw(2, 0)),
            Err(CodecError::NonCanonicalCif { control_type: 2, .. })
        ));
        assert!(matches!(
            encode_control_cif(&raw(0x7FFF, 5)),
            Err(CodecError::NonCanonicalCif {
                control_type: 0x7FFF,
                subtype: 5,
            })
        ));
        assert!(encode_control_cif(&raw(0x7FFF, 42)).is_ok());
        assert!(encode_control_cif(&raw(9, 0)).is_ok());
    }
}
