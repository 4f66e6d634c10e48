use std::collections::HashSet;

use lazy_static::lazy_static;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any", "are",
    "around", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "does", "doing", "down", "during", "each", "even", "few", "for", "from",
    "further", "had", "has", "have", "having", "her", "here", "hers", "him", "his", "how", "into", "its",
    "itself", "just", "more", "most", "much", "must", "new", "not", "now", "off", "once", "only", "other",
    "our", "ours", "out", "over", "own", "said", "same", "says", "she", "should", "some", "such", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "too",
    "under", "until", "very", "was", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "would", "you", "your", "yours",
];

lazy_static! {
    static ref ENGLISH: HashSet<&'static str> = ENGLISH_STOP_WORDS.iter().copied().collect();
}

/// The built-in English stop-word set, shared read-only by every tokenizer.
pub fn english() -> &'static HashSet<&'static str> {
    &ENGLISH
}
