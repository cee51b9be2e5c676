#![no_main]

use isocore::classifier::EventClassifier;
use isocore::replay::parse_line;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and validation must never panic, and rejected records
        // must never reach the aggregate
        let mut classifier = EventClassifier::new();
        if let Ok(Some(raw)) = parse_line(input) {
            let accepted = classifier.classify_raw(raw).is_ok();
            assert_eq!(classifier.aggregate().total_processed(), accepted as u64);
        }
    }
});
