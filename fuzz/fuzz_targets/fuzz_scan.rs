#![no_main]

use bmpcarve_core::{scan_all, NoopVerifier};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (images, summary) = scan_all(data, NoopVerifier);
    let mut last_end = 0;
    for image in &images {
        assert!(image.offset >= last_end);
        assert!(image.end() <= data.len() as u64);
        last_end = image.end();
    }
    assert_eq!(summary.images, images.len());
});
