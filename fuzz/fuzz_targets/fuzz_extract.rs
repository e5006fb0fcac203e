#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use tarpit::intel::{extract, Intelligence, PatternSet};

fn patterns() -> &'static PatternSet {
    static PATTERNS: OnceLock<PatternSet> = OnceLock::new();
    PATTERNS.get_or_init(|| PatternSet::compile().expect("static patterns compile"))
}

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let found = extract(patterns(), text);

        // Extraction must be idempotent: absorbing the same update twice
        // changes nothing.
        let mut intel = Intelligence::default();
        intel.absorb(found.clone());
        let once = intel.clone();
        intel.absorb(found);
        assert_eq!(intel, once);
    }
});
