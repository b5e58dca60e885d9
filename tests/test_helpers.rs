//! Shared builders for integration tests

#![allow(dead_code)]

use songpst::{FrequencyTables, PstConfig};

/// Split a compact song string into one-character syllables.
pub fn song(raw: &str) -> Vec<String> {
    raw.chars().map(|c| c.to_string()).collect()
}

/// The reference three-song corpus: ABC, BCD, CDE.
pub fn reference_corpus() -> Vec<Vec<String>> {
    vec![song("ABC"), song("BCD"), song("CDE")]
}

/// Occurrence tables of the reference corpus at a given order.
pub fn reference_tables(max_order: usize) -> FrequencyTables {
    FrequencyTables::from_sequences(&reference_corpus(), max_order, None)
        .expect("reference corpus counts")
}

/// A corpus with strong second-order structure: after "ab" always "c",
/// after "db" always "a".
pub fn structured_corpus(repeats: usize) -> Vec<Vec<String>> {
    (0..repeats).map(|_| song("abcdbabcdba")).collect()
}

/// Thresholds loose enough to admit the structure of small corpora.
pub fn test_config(max_order: usize) -> PstConfig {
    PstConfig {
        max_order,
        p_min: 0.01,
        g_min: 0.01,
        r: 1.6,
        alpha: 17.5,
        smoothing: true,
    }
}
