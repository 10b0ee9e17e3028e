#![no_main]

use codec::{decode_srt_packet, encode_srt_packet, CodecLimits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let limits = wire::Limits::default();
    let codec_limits = CodecLimits::for_testing();

    let Ok(packet) = decode_srt_packet(data, &limits, &codec_limits) else {
        return;
    };

    // Anything that decodes must re-encode, and the re-encoding must decode
    // to the same packet.
    let Ok(encoded) = encode_srt_packet(&packet) else {
        return;
    };
    let again = decode_srt_packet(&encoded, &wire::Limits::unlimited(), &CodecLimits::unlimited())
        .expect("re-encoded packet decodes");
    assert_eq!(packet, again);
});
