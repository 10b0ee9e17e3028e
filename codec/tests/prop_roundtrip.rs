//! Property tests: every structurally valid CIF survives encode then decode.

use codec::{
    decode_key_material, decode_loss_list, decode_srt_packet, encode_key_material,
    encode_loss_list, encode_srt_packet, Ack, Cif, CodecError, CodecLimits, ControlPacket,
    EncryptionField, Extension, ExtensionBlock, ExtensionFlags, GroupMembership, GroupType,
    Handshake, HandshakeType, HsExtension, KeyFlags, KeyMaterial, KmPacketType, LossEntry,
    SrtFlags, SrtPacket, WireLimits,
};
use proptest::prelude::*;

const SEQ_MAX: u32 = 0x7FFF_FFFF;

fn ack() -> impl Strategy<Value = Ack> {
    prop_oneof![
        any::<u32>().prop_map(|last_ack_seq| Ack::Light { last_ack_seq }),
        any::<[u32; 4]>().prop_map(|[a, b, c, d]| Ack::Small {
            last_ack_seq: a,
            rtt: b,
            rtt_variance: c,
            available_buffer: d,
        }),
        any::<[u32; 7]>().prop_map(|[a, b, c, d, e, f, g]| Ack::Full {
            last_ack_seq: a,
            rtt: b,
            rtt_variance: c,
            available_buffer: d,
            packets_receiving_rate: e,
            estimated_link_capacity: f,
            receiving_rate: g,
        }),
    ]
}

fn loss_entry() -> impl Strategy<Value = LossEntry> {
    prop_oneof![
        (0..=SEQ_MAX).prop_map(LossEntry::Single),
        (0..=SEQ_MAX, 0..=SEQ_MAX).prop_map(|(from, to)| LossEntry::Range { from, to }),
    ]
}

fn key_material() -> impl Strategy<Value = KeyMaterial> {
    (
        0u8..8,
        prop_oneof![
            Just(KmPacketType::Reserved),
            Just(KmPacketType::MediaStream),
            Just(KmPacketType::KeyingMaterial),
            Just(KmPacketType::MpegTsReserved),
        ],
        prop_oneof![Just(KeyFlags::Even), Just(KeyFlags::Odd), Just(KeyFlags::Both)],
        any::<u32>(),
        any::<(u8, u8, u8)>(),
        0usize..5,
        prop_oneof![Just(16usize), Just(24), Just(32)],
    )
        .prop_flat_map(|(version, packet_type, key_flags, keki, (c, a, s), salt_words, key_len)| {
            let wrap_len = 8 + key_flags.key_count() * key_len;
            (
                prop::collection::vec(any::<u8>(), salt_words * 4),
                prop::collection::vec(any::<u8>(), wrap_len),
            )
                .prop_map(move |(salt, wrap)| KeyMaterial {
                    version,
                    packet_type,
                    key_flags,
                    keki,
                    cipher: c,
                    auth: a,
                    stream_encapsulation: s,
                    salt,
                    wrap,
                })
        })
}

fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9#!:=,/_.-]{0,64}"
}

fn extension() -> impl Strategy<Value = Extension> {
    let hs = (any::<u32>(), any::<u32>(), any::<u16>(), any::<u16>()).prop_map(
        |(srt_version, flags, receiver_tsbpd_delay, sender_tsbpd_delay)| HsExtension {
            srt_version,
            flags: SrtFlags::from_raw(flags),
            receiver_tsbpd_delay,
            sender_tsbpd_delay,
        },
    );
    let group = (any::<u32>(), any::<u8>(), any::<u8>(), any::<u16>()).prop_map(
        |(group_id, group_type, flags, weight)| GroupMembership {
            group_id,
            group_type: GroupType::from_raw(group_type),
            flags,
            weight,
        },
    );
    prop_oneof![
        hs.clone().prop_map(Extension::HsReq),
        hs.prop_map(Extension::HsRsp),
        key_material().prop_map(Extension::KmReq),
        key_material().prop_map(Extension::KmRsp),
        any::<u32>().prop_map(Extension::KmRspState),
        text().prop_map(Extension::StreamId),
        text().prop_map(Extension::Congestion),
        text().prop_map(Extension::Filter),
        group.prop_map(Extension::Group),
    ]
}

fn extension_block() -> impl Strategy<Value = ExtensionBlock> {
    (
        any::<u16>(),
        prop::collection::vec(any::<[u8; 4]>(), 0..6),
    )
        .prop_map(|(ext_type, words)| {
            ExtensionBlock::new(ext_type, words.concat()).expect("short block")
        })
}

fn handshake() -> impl Strategy<Value = Handshake> {
    (
        any::<u32>(),
        any::<(u16, u16)>(),
        any::<[u32; 3]>(),
        any::<u32>(),
        any::<[u32; 2]>(),
        any::<[u32; 4]>(),
        prop::collection::vec(extension_block(), 0..4),
    )
        .prop_map(|(version, (encryption, flags), sizes, hs_type, ids, peer_ip, extensions)| {
            let [initial_seq, mtu, flow_window] = sizes;
            let [socket_id, syn_cookie] = ids;
            Handshake {
                version,
                encryption: EncryptionField::from_raw(encryption),
                extension_flags: ExtensionFlags::from_raw(flags),
                initial_seq,
                mtu,
                flow_window,
                handshake_type: HandshakeType::from_raw(hs_type),
                socket_id,
                syn_cookie,
                peer_ip,
                extensions,
            }
        })
}

fn cif() -> impl Strategy<Value = Cif> {
    prop_oneof![
        handshake().prop_map(Cif::Handshake),
        Just(Cif::KeepAlive),
        (any::<u32>(), ack()).prop_map(|(ack_number, ack)| Cif::Ack { ack_number, ack }),
        prop::collection::vec(loss_entry(), 0..32).prop_map(Cif::Nak),
        Just(Cif::CongestionWarning),
        Just(Cif::Shutdown),
        any::<u32>().prop_map(|ack_number| Cif::AckAck { ack_number }),
        any::<[u32; 3]>().prop_map(|[message_number, first_seq, last_seq]| Cif::DropRequest {
            message_number,
            first_seq,
            last_seq,
        }),
        any::<u32>().prop_map(|code| Cif::PeerError { code }),
        extension().prop_map(Cif::UserDefined),
        (
            prop_oneof![9u16..0x7FFF, Just(0x7FFF)],
            any::<u16>(),
            any::<u32>(),
            prop::collection::vec(any::<u8>(), 0..32),
        )
            .prop_filter("user-defined subtypes 1..=8 are typed", |(t, s, _, _)| {
                *t != 0x7FFF || !(1..=8).contains(s)
            })
            .prop_map(|(control_type, subtype, type_specific_info, payload)| Cif::Raw {
                control_type,
                subtype,
                type_specific_info,
                payload,
            }),
    ]
}

proptest! {
    #[test]
    fn control_packet_roundtrip(cif in cif(), timestamp: u32, destination_id: u32) {
        let packet = SrtPacket::Control(ControlPacket { timestamp, destination_id, cif });
        let bytes = encode_srt_packet(&packet).unwrap();
        let decoded = decode_srt_packet(&bytes, &WireLimits::unlimited(), &CodecLimits::unlimited())
            .unwrap();
        prop_assert_eq!(decoded, packet);
    }

    #[test]
    fn user_defined_unknown_extension_rejected(block in extension_block(), timestamp: u32) {
        let cif = Cif::UserDefined(Extension::Unknown(block.clone()));
        let packet = SrtPacket::Control(ControlPacket { timestamp, destination_id: 0, cif });
        prop_assert_eq!(
            encode_srt_packet(&packet).unwrap_err(),
            CodecError::NonCanonicalCif { control_type: 0x7FFF, subtype: block.ext_type }
        );
    }

    #[test]
    fn raw_cif_for_known_type_rejected(
        control_type in 0u16..=8,
        payload in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let cif = Cif::Raw { control_type, subtype: 0, type_specific_info: 0, payload };
        let packet = SrtPacket::Control(ControlPacket { timestamp: 0, destination_id: 0, cif });
        let is_rejected = matches!(
            encode_srt_packet(&packet),
            Err(CodecError::NonCanonicalCif { .. })
        );
        prop_assert!(is_rejected);
    }

    #[test]
    fn key_material_roundtrip(km in key_material()) {
        let bytes = encode_key_material(&km).unwrap();
        prop_assert_eq!(bytes.len(), km.encoded_len());
        prop_assert_eq!(decode_key_material(&bytes).unwrap(), km);
    }

    #[test]
    fn loss_list_roundtrip(list in prop::collection::vec(loss_entry(), 0..64)) {
        let bytes = encode_loss_list(&list).unwrap();
        prop_assert_eq!(decode_loss_list(&bytes, &CodecLimits::unlimited()).unwrap(), list);
    }

    #[test]
    fn wide_sequence_numbers_rejected(seq in (SEQ_MAX + 1)..) {
        let is_overflow = matches!(
            encode_loss_list(&[LossEntry::Single(seq)]),
            Err(CodecError::Encode(_))
        );
        prop_assert!(is_overflow);
    }

    #[test]
    fn arbitrary_bytes_never_panic(buf in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_srt_packet(&buf, &WireLimits::default(), &CodecLimits::default());
    }

    #[test]
    fn arbitrary_key_material_never_panics(buf in prop::collection::vec(any::<u8>(), 0..96)) {
        let _ = decode_key_material(&buf);
    }
}
