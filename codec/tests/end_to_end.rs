//! Byte-level scenarios through the whole stack.

use codec::{
    decode_control_cif, decode_extension_chain, decode_key_material, decode_loss_list,
    decode_srt_packet, encode_key_material, encode_loss_list, encode_srt_packet, Ack, Cif,
    CodecError, CodecLimits, ControlPacket, EncryptionField, Extension, ExtensionFlags,
    Handshake, HandshakeType, KeyFlags, KeyMaterial, KmPacketType, LossEntry, SrtPacket,
    WireLimits, CIPHER_AES_CTR, SE_MPEG_TS_SRT,
};
use codec::validate::{validate_handshake, ValidationError};
use wire::{decode_control_header, decode_packet, ControlType, DecodeError};

fn words(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

fn decode(bytes: &[u8]) -> Result<SrtPacket<'_>, CodecError> {
    decode_srt_packet(bytes, &WireLimits::default(), &CodecLimits::default())
}

#[test]
fn full_ack_end_to_end() {
    let packet = SrtPacket::Control(ControlPacket {
        timestamp: 123_456,
        destination_id: 0x0ABC_DEF0,
        cif: Cif::Ack {
            ack_number: 42,
            ack: Ack::Full {
                last_ack_seq: 1000,
                rtt: 5000,
                rtt_variance: 200,
                available_buffer: 100,
                packets_receiving_rate: 50,
                estimated_link_capacity: 1000,
                receiving_rate: 60000,
            },
        },
    });

    let bytes = encode_srt_packet(&packet).unwrap();
    assert_eq!(bytes.len(), 44);
    assert_eq!(
        bytes,
        words(&[
            0x8002_0000,
            42,
            123_456,
            0x0ABC_DEF0,
            1000,
            5000,
            200,
            100,
            50,
            1000,
            60000
        ])
    );
    assert_eq!(decode(&bytes).unwrap(), packet);
}

#[test]
fn ack_layout_selected_by_length() {
    let mut bytes = words(&[0x8002_0000, 7, 0, 1]);
    bytes.extend(words(&[1, 2, 3, 4]));

    let SrtPacket::Control(control) = decode(&bytes).unwrap() else {
        panic!("expected control packet");
    };
    assert_eq!(
        control.cif,
        Cif::Ack {
            ack_number: 7,
            ack: Ack::Small {
                last_ack_seq: 1,
                rtt: 2,
                rtt_variance: 3,
                available_buffer: 4,
            },
        }
    );

    bytes.extend(words(&[5]));
    assert_eq!(
        decode(&bytes).unwrap_err(),
        CodecError::TruncatedCif {
            control_type: ControlType::Ack,
            actual: 20,
        }
    );
}

#[test]
fn nak_loss_list_through_header() {
    let mut bytes = words(&[0x8003_0000, 0, 9, 1]);
    bytes.extend(words(&[0x0000_0005, 0x8000_000A, 0x0000_0014]));

    let packet = decode_packet(&bytes, &WireLimits::default()).unwrap();
    let header = decode_control_header(&packet).unwrap();
    let cif = decode_control_cif(&header, &CodecLimits::default()).unwrap();
    assert_eq!(
        cif,
        Cif::Nak(vec![
            LossEntry::Single(5),
            LossEntry::Range { from: 10, to: 20 }
        ])
    );
}

#[test]
fn loss_list_order_is_preserved() {
    let list = vec![
        LossEntry::Single(5),
        LossEntry::Single(6),
        LossEntry::Range { from: 10, to: 20 },
    ];
    let bytes = encode_loss_list(&list).unwrap();
    assert_eq!(
        decode_loss_list(&bytes, &CodecLimits::default()).unwrap(),
        list
    );
}

#[test]
fn extension_overrun_inside_handshake() {
    let mut cif = vec![0u8; 48];
    cif.extend_from_slice(&[0, 5, 0, 2, b'a', b'b', b'c', b'd']);
    let mut bytes = words(&[0x8000_0000, 0, 0, 0]);
    bytes.extend_from_slice(&cif);

    assert!(matches!(
        decode(&bytes).unwrap_err(),
        CodecError::ExtensionOverrun { offset: 0, .. }
    ));
    assert!(matches!(
        decode_extension_chain(&cif[48..], &CodecLimits::default()),
        Err(CodecError::ExtensionOverrun { .. })
    ));
}

#[test]
fn key_material_signature_checked() {
    let km = KeyMaterial {
        version: 1,
        packet_type: KmPacketType::KeyingMaterial,
        key_flags: KeyFlags::Both,
        keki: 0,
        cipher: CIPHER_AES_CTR,
        auth: 0,
        stream_encapsulation: SE_MPEG_TS_SRT,
        salt: vec![0x5A; 16],
        wrap: vec![0xA5; 8 + 2 * 16],
    };
    let mut bytes = encode_key_material(&km).unwrap();
    assert_eq!(decode_key_material(&bytes).unwrap(), km);

    bytes[1] = 0;
    bytes[2] = 0;
    assert_eq!(
        decode_key_material(&bytes).unwrap_err(),
        CodecError::BadSignature { found: 0 }
    );
}

#[test]
fn data_packet_with_both_keys_rejected() {
    let bytes = words(&[0x0000_0001, 0xD800_0001, 0, 1]);
    assert_eq!(
        decode(&bytes).unwrap_err(),
        CodecError::Wire(DecodeError::InvalidKeyFlag { value: 0b11 })
    );
}

#[test]
fn conclusion_handshake_with_key_material() {
    let km = KeyMaterial {
        version: 1,
        packet_type: KmPacketType::KeyingMaterial,
        key_flags: KeyFlags::Even,
        keki: 0,
        cipher: CIPHER_AES_CTR,
        auth: 0,
        stream_encapsulation: SE_MPEG_TS_SRT,
        salt: vec![1; 16],
        wrap: vec![2; 8 + 32],
    };
    let hs = Handshake {
        version: 5,
        encryption: EncryptionField::Aes256,
        extension_flags: ExtensionFlags::from_raw(ExtensionFlags::KMREQ | ExtensionFlags::CONFIG),
        initial_seq: 77,
        mtu: 1500,
        flow_window: 8192,
        handshake_type: HandshakeType::Conclusion,
        socket_id: 5,
        syn_cookie: 6,
        peer_ip: [0xC0A8_0001, 0, 0, 0],
        extensions: vec![
            Extension::KmReq(km).to_block().unwrap(),
            Extension::StreamId("live/cam1".into()).to_block().unwrap(),
        ],
    };
    let packet = SrtPacket::Control(ControlPacket {
        timestamp: 0,
        destination_id: 0,
        cif: Cif::Handshake(hs.clone()),
    });

    let bytes = encode_srt_packet(&packet).unwrap();
    let SrtPacket::Control(control) = decode(&bytes).unwrap() else {
        panic!("expected control packet");
    };
    let Cif::Handshake(decoded) = control.cif else {
        panic!("expected handshake");
    };
    assert_eq!(decoded, hs);
    assert!(validate_handshake(&decoded, &CodecLimits::default()).is_ok());

    let mut downgraded = decoded;
    downgraded.encryption = EncryptionField::Aes128;
    assert_eq!(
        validate_handshake(&downgraded, &CodecLimits::default()).unwrap_err(),
        ValidationError::KeyLengthMismatch {
            expected: 16,
            actual: 32,
        }
    );
}
