//! Symptom text normalization and term extraction.

use std::sync::OnceLock;

use regex::Regex;

/// Function words dropped before building terms. Content words such as
/// "back" or "side" are kept because they carry symptom meaning
/// ("back pain", "side ache").
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either", "else",
    "ever", "every", "few", "for", "from", "further", "had", "has", "have", "having", "he",
    "her", "here", "hers", "him", "his", "how", "however", "if", "in", "into", "is", "it",
    "its", "itself", "just", "me", "more", "most", "much", "my", "myself", "neither", "no",
    "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "upon", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "within", "without", "would",
    "yet", "you", "your", "yours",
];

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[;,/\-]").expect("valid separator regex"))
}

fn punctuation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid punctuation regex"))
}

/// Canonical form of symptom input: lowercase, list separators turned into
/// spaces, remaining punctuation removed, whitespace collapsed.
///
/// Idempotent; blank input yields an empty string.
pub fn normalize_symptoms(text: &str) -> String {
    let lowered = text.to_lowercase();
    let spaced = separator_re().replace_all(&lowered, " ");
    let stripped = punctuation_re().replace_all(&spaced, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Unigram and bigram terms of already-normalized text, in text order
/// (all unigrams first, then bigrams). Tokens shorter than two characters
/// and stop words are dropped before bigrams are formed.
pub fn terms(normalized: &str) -> Vec<String> {
    let tokens: Vec<&str> = normalized
        .split_whitespace()
        .filter(|token| token.chars().count() >= 2 && !is_stop_word(token))
        .collect();

    let mut out: Vec<String> = tokens.iter().map(|t| (*t).to_string()).collect();
    out.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    out
}

/// Splits a delimited field into trimmed, non-empty phrases.
pub fn split_phrases(text: &str, delimiter: char) -> Vec<String> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .map(str::to_string)
        .collect()
}
