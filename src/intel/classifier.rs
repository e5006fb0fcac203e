//! Scam classification — a stateless predicate over one message.

use super::patterns::{terms_in, PatternSet};

/// Returns true when the text carries any scam signal: a vocabulary term
/// (case-insensitive), a link, or a payment identifier. The caller OR-updates
/// the session's sticky detection flag with this result; nothing ever uses it
/// to clear that flag.
pub fn classify(patterns: &PatternSet, text: &str) -> bool {
    if !terms_in(text).is_empty() {
        return true;
    }
    patterns.links.is_match(text) || patterns.payment_identifiers.is_match(text)
}
