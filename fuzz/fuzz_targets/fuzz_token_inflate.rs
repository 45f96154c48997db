#![no_main]

use libfuzzer_sys::fuzz_target;
use linkpad_transfer::inflate_token;

const LIMIT: usize = 1 << 20;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Neither layer may panic on hostile input.
    if let Ok(buffer) = inflate_token(text, LIMIT) {
        let _ = linkpad_core::codec::decode(&buffer);
    }
});
