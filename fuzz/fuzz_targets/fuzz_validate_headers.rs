#![no_main]

use bmpcarve_core::bmp::{validate_headers, Validation};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Validation::Accepted(candidate) = validate_headers(data, 0, data.len() as u64) {
        assert!(candidate.end() <= data.len() as u64);
        assert!(candidate.info_header.abs_height() >= 1);
    }
});
