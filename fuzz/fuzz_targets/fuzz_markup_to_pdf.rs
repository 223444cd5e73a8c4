#![no_main]

use gstbill::core::DocumentConverter;
use gstbill::pdf::PdfConverter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Must not panic: errors are fine, panics are bugs.
        let _ = PdfConverter::new().convert(s);
    }
});
