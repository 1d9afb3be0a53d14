#![no_main]
use libfuzzer_sys::fuzz_target;
use polywit_lang::SourceLanguage;
use polywit_witness::{ScopeFilter, WitnessGraph};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let Ok(graph) = WitnessGraph::from_graphml(s, "fuzz.graphml") else {
            return;
        };
        let _ = graph.check_attributes(SourceLanguage::Java);
        if let Ok(linear) = graph.into_linear() {
            let _ = linear.assumptions_in_path_order(ScopeFilter::Strict);
        }
    }
});
