#![no_main]

use libfuzzer_sys::fuzz_target;
use strongroom_core::{compile, CompileRequest};

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        // Backend JSON is untrusted; any failure must surface as an error
        if let Ok(request) = CompileRequest::from_json(json) {
            let _ = compile(&request);
        }
    }
});
