#![no_main]
use libfuzzer_sys::fuzz_target;
use polywit_lang::{JavaProvider, KotlinProvider, ParseTreeProvider};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Neither provider may panic on any input.
        let _ = JavaProvider.parse(s, "Fuzz.java");
        let _ = KotlinProvider.parse(s, "Fuzz.kt");
    }
});
