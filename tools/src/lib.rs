//! Inspection and decoding tools for SRT packet captures.
//!
//! The binary reads one datagram per file (raw bytes or hex text) and either
//! summarizes it or prints the fully typed packet.
//!
//! # Design Principles
//!
//! - **Human-readable output** - Make it easy to see what is on the wire.
//! - **Same decoder as production** - Everything goes through `codec`, with
//!   the same limits a receiver would apply.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use codec::{
    decode_srt_packet_from, Ack, Cif, CodecLimits, Extension, ExtensionType, SrtPacket,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wire::{decode_packet, ControlHeader, ControlType, Limits, PacketKind};

/// Decode limits loaded from a JSON file. Missing fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub wire: Limits,
    pub codec: CodecLimits,
}

/// Parses a limits file.
pub fn parse_limits(json: &str) -> Result<LimitsConfig> {
    serde_json::from_str(json).context("parse limits json")
}

/// Reads and parses a limits file.
pub fn load_limits(path: &Path) -> Result<LimitsConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read limits {}", path.display()))?;
    let limits = parse_limits(&contents)?;
    debug!(?limits, path = %path.display(), "loaded limits");
    Ok(limits)
}

/// Turns file contents into datagram bytes.
///
/// With `hex`, the contents are hex text; whitespace is ignored.
pub fn read_packet_bytes(contents: &[u8], hex: bool) -> Result<Vec<u8>> {
    if !hex {
        return Ok(contents.to_vec());
    }
    let text: Vec<u8> = contents
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    hex::decode(text).context("decode hex packet")
}

/// Summary of one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub kind: PacketKind,
    pub total_len: usize,
    pub timestamp: u32,
    pub destination_id: u32,
    /// Data: sequence number. Control: type and subtype.
    pub headline: String,
    pub body_len: usize,
    pub details: Vec<String>,
}

/// Decodes and summarizes a packet.
pub fn inspect_packet(
    bytes: &[u8],
    limits: &Limits,
    codec_limits: &CodecLimits,
) -> Result<InspectReport> {
    let packet = decode_packet(bytes, limits).context("decode envelope")?;
    debug!(len = bytes.len(), kind = %packet.kind(), "inspecting packet");
    let typed = decode_srt_packet_from(&packet, codec_limits).context("decode packet")?;

    let (headline, details) = match &typed {
        SrtPacket::Data(data) => (
            format!("seq {} msg {}", data.seq_number, data.message_number),
            vec![format!(
                "position {:?} in_order {} key {:?} retransmitted {}",
                data.position, data.in_order, data.key_flag, data.retransmitted
            )],
        ),
        SrtPacket::Control(control) => {
            let header = ControlHeader::from_packet(&packet).context("decode control header")?;
            (
                format!(
                    "{} subtype {} info {}",
                    header.control_type, header.subtype, header.type_specific_info
                ),
                cif_details(&control.cif),
            )
        }
    };

    Ok(InspectReport {
        kind: packet.kind(),
        total_len: bytes.len(),
        timestamp: packet.timestamp,
        destination_id: packet.destination_id,
        headline,
        body_len: packet.body.len(),
        details,
    })
}

fn cif_details(cif: &Cif) -> Vec<String> {
    match cif {
        Cif::Handshake(hs) => {
            let mut lines = vec![
                format!(
                    "version {} type {:?} encryption {:?} flags 0x{:04x}",
                    hs.version,
                    hs.handshake_type,
                    hs.encryption,
                    hs.extension_flags.raw()
                ),
                format!(
                    "isn {} mtu {} window {} socket {} cookie 0x{:08x}",
                    hs.initial_seq, hs.mtu, hs.flow_window, hs.socket_id, hs.syn_cookie
                ),
            ];
            for block in &hs.extensions {
                let name = ExtensionType::from_raw(block.ext_type)
                    .map_or_else(|| format!("type {}", block.ext_type), |t| format!("{t:?}"));
                lines.push(format!("extension {name}: {} bytes", block.contents.len()));
            }
            lines
        }
        Cif::Ack { ack, .. } => {
            let layout = match ack {
                Ack::Light { .. } => "light",
                Ack::Small { .. } => "small",
                Ack::Full { .. } => "full",
            };
            vec![format!("{layout} ack, last ack seq {}", ack.last_ack_seq())]
        }
        Cif::Nak(list) => vec![format!("{} loss entries", list.len())],
        Cif::DropRequest {
            first_seq,
            last_seq,
            ..
        } => vec![format!("drop seq {first_seq}..={last_seq}")],
        Cif::UserDefined(ext) => vec![extension_summary(ext)],
        Cif::Raw { payload, .. } => vec![format!("raw cif, {} bytes", payload.len())],
        _ => Vec::new(),
    }
}

fn extension_summary(ext: &Extension) -> String {
    match ext {
        Extension::HsReq(hs) | Extension::HsRsp(hs) => format!(
            "srt version 0x{:06x} flags 0x{:02x} tsbpd rcv {} snd {}",
            hs.srt_version,
            hs.flags.raw(),
            hs.receiver_tsbpd_delay,
            hs.sender_tsbpd_delay
        ),
        Extension::KmReq(km) | Extension::KmRsp(km) => format!(
            "key material {:?}, {} key(s) of {} bytes",
            km.key_flags,
            km.key_count(),
            km.key_len()
        ),
        Extension::KmRspState(state) => format!("key material state {state}"),
        Extension::StreamId(value) | Extension::Congestion(value) | Extension::Filter(value) => {
            format!("{value:?}")
        }
        Extension::Group(group) => format!(
            "group {} {:?} weight {}",
            group.group_id, group.group_type, group.weight
        ),
        Extension::Unknown(block) => {
            format!("type {}, {} bytes", block.ext_type, block.contents.len())
        }
    }
}

/// JSON view of a decoded packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedPacket {
    pub timestamp: u32,
    pub destination_id: u32,
    pub body: DecodedBody,
}

/// Family-specific part of [`DecodedPacket`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedBody {
    Data {
        seq_number: u32,
        position: wire::PacketPosition,
        in_order: bool,
        key_flag: wire::KeyFlag,
        retransmitted: bool,
        message_number: u32,
        payload_len: usize,
        payload_hex: String,
    },
    Control {
        control_type: ControlType,
        subtype: u16,
        type_specific_info: u32,
        cif: Cif,
    },
}

/// Decodes a packet into its JSON view.
pub fn decode_packet_json(
    bytes: &[u8],
    limits: &Limits,
    codec_limits: &CodecLimits,
) -> Result<DecodedPacket> {
    let packet = decode_packet(bytes, limits).context("decode envelope")?;
    let typed = decode_srt_packet_from(&packet, codec_limits).context("decode packet")?;
    let body = match typed {
        SrtPacket::Data(data) => DecodedBody::Data {
            seq_number: data.seq_number,
            position: data.position,
            in_order: data.in_order,
            key_flag: data.key_flag,
            retransmitted: data.retransmitted,
            message_number: data.message_number,
            payload_len: data.payload.len(),
            payload_hex: hex::encode(data.payload),
        },
        SrtPacket::Control(control) => DecodedBody::Control {
            control_type: control.cif.control_type(),
            subtype: control.cif.subtype(),
            type_specific_info: control.cif.type_specific_info(),
            cif: control.cif,
        },
    };
    Ok(DecodedPacket {
        timestamp: packet.timestamp,
        destination_id: packet.destination_id,
        body,
    })
}

/// Renders a decoded packet for terminals.
pub fn format_decode_pretty(packet: &DecodedPacket) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "timestamp: {} destination: {}",
        packet.timestamp, packet.destination_id
    );
    match &packet.body {
        DecodedBody::Data {
            seq_number,
            position,
            in_order,
            key_flag,
            retransmitted,
            message_number,
            payload_len,
            ..
        } => {
            let _ = writeln!(out, "data seq {seq_number} msg {message_number}");
            let _ = writeln!(
                out,
                "  position {position:?} in_order {in_order} key {key_flag:?} retransmitted {retransmitted}"
            );
            let _ = write!(out, "  payload {payload_len} bytes");
        }
        DecodedBody::Control {
            control_type,
            subtype,
            type_specific_info,
            cif,
        } => {
            let _ = writeln!(
                out,
                "control {control_type} subtype {subtype} info {type_specific_info}"
            );
            let _ = write!(out, "  {cif:#?}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    fn full_ack() -> Vec<u8> {
        words(&[0x8002_0000, 42, 7, 9, 1000, 5000, 200, 100, 50, 1000, 60000])
    }

    #[test]
    fn inspect_full_ack() {
        let report =
            inspect_packet(&full_ack(), &Limits::default(), &CodecLimits::default()).unwrap();
        assert_eq!(report.kind, PacketKind::Control);
        assert_eq!(report.total_len, 44);
        assert_eq!(report.body_len, 28);
        assert_eq!(report.headline, "ack subtype 0 info 42");
        assert_eq!(report.details, vec!["full ack, last ack seq 1000".to_string()]);
    }

    #[test]
    fn inspect_data_packet() {
        let mut bytes = words(&[5, 0xC000_0003, 1, 2]);
        bytes.extend_from_slice(b"payload");
        let report = inspect_packet(&bytes, &Limits::default(), &CodecLimits::default()).unwrap();
        assert_eq!(report.kind, PacketKind::Data);
        assert_eq!(report.headline, "seq 5 msg 3");
        assert_eq!(report.body_len, 7);
    }

    #[test]
    fn inspect_reports_errors() {
        let err = inspect_packet(&[0; 4], &Limits::default(), &CodecLimits::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("malformed header"));
    }

    #[test]
    fn decode_json_shape() {
        let decoded =
            decode_packet_json(&full_ack(), &Limits::default(), &CodecLimits::default()).unwrap();
        let json = serde_json::to_value(&decoded).unwrap();
        assert_eq!(json["timestamp"], 7);
        assert_eq!(json["body"]["kind"], "control");
        assert_eq!(json["body"]["type_specific_info"], 42);
        assert_eq!(json["body"]["cif"]["Ack"]["ack"]["Full"]["rtt"], 5000);
    }

    #[test]
    fn decode_json_data_payload_is_hex() {
        let mut bytes = words(&[5, 0xC000_0003, 1, 2]);
        bytes.extend_from_slice(&[0xDE, 0xAD]);
        let decoded =
            decode_packet_json(&bytes, &Limits::default(), &CodecLimits::default()).unwrap();
        let json = serde_json::to_value(&decoded).unwrap();
        assert_eq!(json["body"]["kind"], "data");
        assert_eq!(json["body"]["payload_hex"], "dead");
        assert_eq!(json["body"]["position"], "Solo");
    }

    #[test]
    fn pretty_output() {
        let decoded =
            decode_packet_json(&full_ack(), &Limits::default(), &CodecLimits::default()).unwrap();
        let text = format_decode_pretty(&decoded);
        assert!(text.starts_with("timestamp: 7 destination: 9"));
        assert!(text.contains("control ack subtype 0 info 42"));
        assert!(text.contains("receiving_rate: 60000"));
    }

    #[test]
    fn hex_input_ignores_whitespace() {
        let bytes = read_packet_bytes(b"80 02 00 00\n0000002a\n", true).unwrap();
        assert_eq!(bytes, vec![0x80, 0x02, 0, 0, 0, 0, 0, 0x2A]);
        assert!(read_packet_bytes(b"zz", true).is_err());
        assert_eq!(read_packet_bytes(b"zz", false).unwrap(), b"zz");
    }

    #[test]
    fn limits_file_defaults_missing_fields() {
        let limits = parse_limits(r#"{"codec": {"max_loss_entries": 8}}"#).unwrap();
        assert_eq!(limits.wire, Limits::default());
        assert_eq!(limits.codec.max_loss_entries, 8);
        assert_eq!(limits.codec.max_stream_id_bytes, 512);
        assert!(parse_limits("{").is_err());
    }
}
