#![no_main]

use fragments::{DumpOptions, dump_fragments, decode_container};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // A decoded container has already passed verification
    if let Ok(decoded) = decode_container(data) {
        let mut lines: Vec<String> = Vec::new();
        dump_fragments(&decoded, &DumpOptions::default(), &mut lines).unwrap();
    }
});
