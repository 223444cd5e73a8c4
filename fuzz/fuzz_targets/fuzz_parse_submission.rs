#![no_main]

use gstbill::core::{EnglishWords, ValidationPolicy, compute, parse_submission};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    // Must not panic: errors are fine, panics are bugs.
    for policy in [
        ValidationPolicy::default(),
        ValidationPolicy {
            reject_negative_net: true,
            calendar_dates: true,
        },
    ] {
        if let Ok(record) = parse_submission(&value, &policy) {
            let _ = compute(&record, &EnglishWords);
        }
    }
});
