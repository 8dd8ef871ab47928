//! Deterministic text metrics over stage outputs
//!
//! Stage outputs are free-form JSON. These helpers reduce them to sets of
//! lowercase content terms so two outputs (or a baseline and an output) can
//! be compared without a gateway round trip.

use serde_json::Value;
use std::collections::BTreeSet;

pub type TermSet = BTreeSet<String>;

const MIN_TERM_LEN: usize = 4;

const STOP_WORDS: &[&str] = &[
    "about", "also", "based", "been", "content", "each", "from", "have", "into", "more",
    "most", "other", "over", "should", "such", "than", "that", "their", "them", "then",
    "there", "these", "they", "this", "through", "very", "what", "when", "which", "will",
    "with", "would", "your",
];

/// Terms of a plain string
pub fn terms_of_text(text: &str) -> TermSet {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TERM_LEN)
        .map(|w| w.to_lowercase())
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Terms of every string value inside a JSON document (keys excluded)
pub fn terms_of(value: &Value) -> TermSet {
    let mut out = TermSet::new();
    collect(value, &mut out);
    out
}

fn collect(value: &Value, out: &mut TermSet) {
    match value {
        Value::String(s) => out.extend(terms_of_text(s)),
        Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect(v, out)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Share of `baseline` terms found in `candidate`; an empty baseline is fully covered
pub fn coverage(baseline: &TermSet, candidate: &TermSet) -> f64 {
    if baseline.is_empty() {
        return 1.0;
    }
    let found = baseline.iter().filter(|t| candidate.contains(*t)).count();
    found as f64 / baseline.len() as f64
}

/// Jaccard overlap; two empty sets are identical
pub fn jaccard(a: &TermSet, b: &TermSet) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}
