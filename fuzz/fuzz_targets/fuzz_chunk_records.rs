#![no_main]

use libfuzzer_sys::fuzz_target;
use modshift::diff::{decode_chunk_records, encode_chunk_records, unpack_records};

fuzz_target!(|data: &[u8]| {
    if let Ok(records) = decode_chunk_records(data) {
        // A stream that decodes re-encodes to the same bytes
        assert_eq!(encode_chunk_records(&records), data);
    }
    let _ = unpack_records(data);
});
