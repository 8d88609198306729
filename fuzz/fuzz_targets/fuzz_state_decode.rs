#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Corrupt state files must be rejected, never panic
    let _ = modshift::diff::state::decode_state(data);
});
