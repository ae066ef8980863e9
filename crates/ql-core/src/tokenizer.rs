//! Word splitting and keyword matching shared by the classifier, the
//! memory amplitude scorer and the companion's reply selection.
//!
//! Matching is substring-based on purpose: "soulmate" counts for the
//! `soul` keyword, "loved" counts for `love`. No stemming, no stop words.

/// Lower-case `text` and split it on whitespace.
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// True if `haystack` contains any of `keywords` as a substring.
pub fn contains_any<S: AsRef<str>>(haystack: &str, keywords: &[S]) -> bool {
    keywords.iter().any(|k| haystack.contains(k.as_ref()))
}

/// Normalize user input for comparisons: trim and lower-case.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}
