#![no_main]

use gstbill::html::Template;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Must not panic: errors are fine, panics are bugs.
        if let Ok(template) = Template::parse(s) {
            let context = serde_json::json!({
                "items": [{"description": "a"}, {"description": "b"}],
                "tax_split": "intra_state",
                "total_amount": "460.20",
            });
            let _ = template.render(&context);
        }
    }
});
