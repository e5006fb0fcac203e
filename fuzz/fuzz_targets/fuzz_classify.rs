#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use tarpit::intel::{classify, extract, PatternSet};

fn patterns() -> &'static PatternSet {
    static PATTERNS: OnceLock<PatternSet> = OnceLock::new();
    PATTERNS.get_or_init(|| PatternSet::compile().expect("static patterns compile"))
}

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let flagged = classify(patterns(), text);

        // A message with a payment identifier, a link, or a suspicious term
        // must always be flagged.
        let found = extract(patterns(), text);
        if !found.payment_identifiers.is_empty()
            || !found.links.is_empty()
            || !found.suspicious_terms.is_empty()
        {
            assert!(flagged);
        }
    }
});
