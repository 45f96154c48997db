#![no_main]

use linkpad_core::codec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decode must never panic or over-allocate, whatever the counts claim.
    if let Ok(state) = codec::decode(data) {
        // Anything that decodes re-encodes to a prefix of the input;
        // trailing bytes are ignored and floats round-trip bit for bit.
        let encoded = codec::encode(&state);
        assert_eq!(encoded.len(), codec::encoded_len(&state));
        assert!(encoded.len() <= data.len());
        assert_eq!(&data[..encoded.len()], encoded.as_slice());
    }
});
