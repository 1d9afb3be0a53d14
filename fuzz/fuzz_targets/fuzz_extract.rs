#![no_main]
use libfuzzer_sys::fuzz_target;
use polywit_lang::SourceLanguage;
use polywit_witness::AssumptionValueExtractor;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for (language, producer) in [
            (SourceLanguage::Java, None),
            (SourceLanguage::Java, Some("GDart")),
            (SourceLanguage::Kotlin, None),
        ] {
            if let Ok(extractor) = AssumptionValueExtractor::for_producer(language, producer) {
                // Extraction is total: a value or nothing, never a panic.
                let _ = extractor.assumption_value(s);
            }
        }
    }
});
