#![no_main]

use bitstream::{BitField, BitReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BitReader::new(data);
    let mut idx = 0usize;

    // Input bytes pick a bounded sequence of cursor operations.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 7;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_bit();
            }
            1 => {
                let bits = (data[idx - 1] % 64).saturating_add(1);
                let _ = reader.read_bits(bits);
            }
            2 => {
                let _ = reader.align_to_byte();
            }
            3 => {
                let _ = reader.read_u16_aligned();
            }
            4 => {
                if let Ok(word) = reader.read_u32_aligned() {
                    let offset = data[idx - 1] % 32;
                    let field = BitField::new(offset, 32 - offset);
                    let value = field.extract(word);
                    assert_eq!(field.insert(0, value).map(|w| field.extract(w)), Ok(value));
                }
            }
            5 => {
                let len = usize::from(data[idx - 1] % 32);
                let _ = reader.read_bytes(len);
            }
            _ => {
                let _ = reader.read_rest();
            }
        }
    }
});
