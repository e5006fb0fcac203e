//! Indicator extraction over raw message text.

use serde::{Deserialize, Serialize};

use super::patterns::{terms_in, PatternSet};

/// Forensic indicators accumulated for one session.
///
/// Each category is an insertion-ordered list with no duplicates; dedup is a
/// linear containment check because first-seen order is part of the contract.
/// Field names serialize in the wire form expected by the collection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intelligence {
    pub account_numbers: Vec<String>,
    pub payment_identifiers: Vec<String>,
    pub links: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub suspicious_terms: Vec<String>,
}

impl Intelligence {
    /// Merge `update` into `self`, appending only values not already present.
    /// Absorbing the same update twice is a no-op.
    pub fn absorb(&mut self, update: Intelligence) {
        merge_unique(&mut self.account_numbers, update.account_numbers);
        merge_unique(&mut self.payment_identifiers, update.payment_identifiers);
        merge_unique(&mut self.links, update.links);
        merge_unique(&mut self.phone_numbers, update.phone_numbers);
        merge_unique(&mut self.suspicious_terms, update.suspicious_terms);
    }

    /// Total indicator count across all categories.
    pub fn len(&self) -> usize {
        self.account_numbers.len()
            + self.payment_identifiers.len()
            + self.links.len()
            + self.phone_numbers.len()
            + self.suspicious_terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn merge_unique(into: &mut Vec<String>, from: Vec<String>) {
    for value in from {
        if !into.iter().any(|existing| *existing == value) {
            into.push(value);
        }
    }
}

/// Run every matcher over `text` and collect the hits, first-occurrence order
/// preserved within each category. Pure function of the text and the tables;
/// duplicates within a single call are already collapsed.
pub fn extract(patterns: &PatternSet, text: &str) -> Intelligence {
    let mut found = Intelligence::default();
    collect_matches(&mut found.payment_identifiers, &patterns.payment_identifiers, text);
    collect_matches(&mut found.phone_numbers, &patterns.phone_numbers, text);
    collect_matches(&mut found.account_numbers, &patterns.account_numbers, text);
    collect_matches(&mut found.links, &patterns.links, text);
    for term in terms_in(text) {
        if !found.suspicious_terms.iter().any(|t| t == term) {
            found.suspicious_terms.push(term.to_string());
        }
    }
    found
}

fn collect_matches(into: &mut Vec<String>, pattern: &regex::Regex, text: &str) {
    for m in pattern.find_iter(text) {
        if !into.iter().any(|existing| existing == m.as_str()) {
            into.push(m.as_str().to_string());
        }
    }
}
