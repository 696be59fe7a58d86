#![no_main]
use libfuzzer_sys::fuzz_target;
use villagerconfig_core::context::RuntimeContext;
use villagerconfig_core::data_loader::load_document_json_bytes;
use villagerconfig_core::trade::generate_report;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a document. Parsing may fail; generating from
    // whatever parses must not panic.
    if let Ok(doc) = load_document_json_bytes(data) {
        let _ = generate_report(&doc, &RuntimeContext::new(0));
    }
});
