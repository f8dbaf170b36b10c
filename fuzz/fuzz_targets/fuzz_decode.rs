#![no_main]
use libfuzzer_sys::fuzz_target;
use msav::{DecodeOptions, LengthMismatchStrategy, SaveDocument};

fuzz_target!(|data: &[u8]| {
    // anything that decodes must encode, and a second pass must be stable
    if let Ok(doc) = SaveDocument::decode(data) {
        if let Ok(out) = doc.encode() {
            let again = SaveDocument::decode(&out).unwrap();
            assert_eq!(again.encode().unwrap(), out);
        }
    }

    let _ = DecodeOptions::new()
        .length_mismatch(LengthMismatchStrategy::Realign)
        .decode(data);
});
