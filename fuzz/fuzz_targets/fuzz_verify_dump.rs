#![no_main]

use fragments::{DumpOptions, VerifierOptions, dump_fragments, root_as_model, verify_model_buffer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Anything the verifier accepts must be safe to walk in full
    if verify_model_buffer(data, &VerifierOptions::default()).is_ok() {
        let _ = root_as_model(data);
    }

    let mut lines: Vec<String> = Vec::new();
    let _ = dump_fragments(data, &DumpOptions::new().with_details(true), &mut lines);
});
