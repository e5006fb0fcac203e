//! Static pattern tables shared by the extractor and the classifier.
//!
//! Patterns are compiled once at startup into a [`PatternSet`] and reused for
//! every message. A bad pattern is a startup error, never a per-turn one.

use anyhow::{Context, Result};
use regex::Regex;

/// Vocabulary scanned against lowercased message text. Containment of any
/// term is a scam signal and the term itself is recorded as an indicator.
pub const SUSPICIOUS_TERMS: [&str; 26] = [
    "urgent",
    "blocked",
    "verify",
    "kyc",
    "upi",
    "pay",
    "bank",
    "account",
    "suspended",
    "expire",
    "refund",
    "prize",
    "lottery",
    "password",
    "otp",
    "click",
    "link",
    "credit card",
    "debit card",
    "pin",
    "cvv",
    "police",
    "cbi",
    "arrest",
    "customs",
    "fedex",
];

/// Compiled matchers for the four indicator categories.
pub struct PatternSet {
    /// UPI-style payment handles (`name@provider`).
    pub payment_identifiers: Regex,
    /// Indian mobile numbers, with or without a `+91` prefix.
    pub phone_numbers: Regex,
    /// Bare 9–18 digit runs. Overlaps with phone numbers; no suppression.
    pub account_numbers: Regex,
    /// http/https URLs.
    pub links: Regex,
}

impl PatternSet {
    /// Compile all matchers up front, like a filter engine would.
    pub fn compile() -> Result<Self> {
        Ok(Self {
            payment_identifiers: compile(r"[a-zA-Z0-9.\-_]{2,49}@[a-zA-Z._]{2,49}")?,
            phone_numbers: compile(r"(?:\+91[\-\s]?)?[6-9]\d{9}\b")?,
            account_numbers: compile(r"\b\d{9,18}\b")?,
            links: compile(r"https?://(?:[-\w.]|(?:%[\da-fA-F]{2}))+[^\s]*")?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("invalid indicator pattern: {pattern}"))
}

/// Vocabulary terms contained in `text`, in table order.
pub fn terms_in(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    SUSPICIOUS_TERMS
        .iter()
        .copied()
        .filter(|term| lowered.contains(term))
        .collect()
}
