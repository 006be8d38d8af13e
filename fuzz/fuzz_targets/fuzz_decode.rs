#![no_main]

use libfuzzer_sys::fuzz_target;
use hexabus_sm::Instruction;

fuzz_target!(|data: &[u8]| {
    // Decode at every offset. The decoder must never panic, and every
    // reported instruction length must stay inside the supplied bounds.
    for offset in 0..=data.len().min(u16::MAX as usize) {
        let offset = offset as u16;
        if let Ok((_, length)) = Instruction::decode(data, offset) {
            assert!(length >= 1, "zero-length instruction at {}", offset);
            assert!(
                offset as usize + length as usize <= data.len(),
                "instruction at {} claims {} bytes past the program end",
                offset,
                length
            );
        }
    }
});
