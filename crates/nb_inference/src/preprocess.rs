use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "said", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

lazy_static! {
    static ref STOPWORD_SET: HashSet<&'static str> = STOPWORDS.iter().copied().collect();
    static ref DISALLOWED: Regex = Regex::new(r"[^a-z0-9\s-]").expect("static pattern");
}

/// Lowercases, strips punctuation (hyphens survive) and drops English stopwords.
pub fn preprocess_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = DISALLOWED.replace_all(&lowered, "");
    cleaned
        .split_whitespace()
        .filter(|word| !STOPWORD_SET.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}
