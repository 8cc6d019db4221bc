//! Tokenization shared by index-time and query-time BM25 (spec §4.3, §8 T4):
//! lower-case, split on non-alphanumeric boundaries, drop a fixed English
//! stopword list, stem with a deterministic Snowball-Porter stemmer.
//!
//! Grounded on the original's `bm25s.tokenize` + `PyStemmer("english")`
//! pairing; `rust_stemmers::Algorithm::English` is the same Snowball-Porter
//! family.

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

/// A fixed, deliberately small English stopword list (closed set, spec
/// §4.3's "fixed stopword list").
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "else", "for", "while", "with", "of",
    "to", "in", "on", "at", "by", "is", "are", "was", "were", "be", "been", "being", "this",
    "that", "these", "those", "it", "its", "as", "from", "into", "not", "no", "do", "does",
    "did", "have", "has", "had", "will", "would", "can", "could", "should", "may", "might",
    "we", "you", "they", "he", "she", "i", "their", "our", "your", "his", "her",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Tokenize one piece of text (query or document) into stemmed, stopword-
/// filtered tokens. Index-time and query-time both call this function, so
/// tokenization symmetry (spec §8 T4) holds trivially.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .filter(|token| !STOPWORD_SET.contains(token))
        .map(|token| STEMMER.stem(token).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_punctuation() {
        let tokens = tokenize("Hello, World!");
        assert_eq!(tokens, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn drops_stopwords() {
        let tokens = tokenize("the quick and the dead");
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"and".to_string()));
    }

    #[test]
    fn query_and_document_tokenize_identically() {
        assert_eq!(tokenize("Running Fast"), tokenize("running fast"));
    }
}
