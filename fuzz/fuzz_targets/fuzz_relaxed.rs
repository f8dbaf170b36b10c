#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(value) = msav::relaxed::from_str(text) {
            let written = msav::relaxed::to_string(&value);
            assert_eq!(msav::relaxed::from_str(&written).unwrap(), value);
        }
    }
});
