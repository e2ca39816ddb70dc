//! Token-count vectorizer over a vocabulary observed at fit time.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Current serialization format version for [`CountVectorizer`].
pub const VECTORIZER_VERSION: i64 = 1;

/// A token is a maximal run of two or more word characters.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Maps raw text to fixed-width token-occurrence counts.
///
/// The vocabulary is rebuilt from scratch on every fit; it is never extended
/// incrementally. Tokens are lowercased, and single-character tokens are
/// excluded by the token pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountVectorizer {
    /// Serialization format version.
    pub model_version: i64,
    /// Sorted, de-duplicated lowercase vocabulary.
    pub vocabulary: Vec<String>,
}

impl CountVectorizer {
    /// Build a vectorizer from the distinct tokens of the given inputs.
    pub fn fit<S: AsRef<str>>(inputs: &[S]) -> Self {
        let mut vocabulary = BTreeSet::new();
        for input in inputs {
            for token in tokenize(input.as_ref()) {
                vocabulary.insert(token);
            }
        }
        Self {
            model_version: VECTORIZER_VERSION,
            vocabulary: vocabulary.into_iter().collect(),
        }
    }

    /// Validate structural invariants of a (possibly deserialized) vectorizer.
    pub fn validate(&self) -> Result<(), String> {
        if self.vocabulary.is_empty() {
            return Err("Vectorizer vocabulary is empty".to_string());
        }
        for pair in self.vocabulary.windows(2) {
            if pair[0] >= pair[1] {
                return Err("Vectorizer vocabulary must be sorted and unique".to_string());
            }
        }
        Ok(())
    }

    /// Number of features produced per input.
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Map text to occurrence counts over the vocabulary.
    ///
    /// Out-of-vocabulary tokens are silently ignored.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut counts = vec![0.0; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Ok(index) = self.vocabulary.binary_search(&token) {
                counts[index] += 1.0;
            }
        }
        counts
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    TOKEN_PATTERN
        .find_iter(text)
        .map(|token| token.as_str().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_builds_sorted_lowercase_vocabulary() {
        let vectorizer = CountVectorizer::fit(&["Great Product", "great price"]);
        assert_eq!(vectorizer.vocabulary, vec!["great", "price", "product"]);
        vectorizer.validate().unwrap();
    }

    #[test]
    fn single_character_tokens_are_excluded() {
        let vectorizer = CountVectorizer::fit(&["a b c ok"]);
        assert_eq!(vectorizer.vocabulary, vec!["ok"]);
    }

    #[test]
    fn transform_counts_token_occurrences() {
        let vectorizer = CountVectorizer::fit(&["good good bad"]);
        let counts = vectorizer.transform("good bad good GOOD");
        // vocabulary: [bad, good]
        assert_eq!(counts, vec![1.0, 3.0]);
    }

    #[test]
    fn unseen_tokens_contribute_nothing() {
        let vectorizer = CountVectorizer::fit(&["alpha beta"]);
        let counts = vectorizer.transform("gamma delta");
        assert_eq!(counts, vec![0.0, 0.0]);
    }

    #[test]
    fn empty_vocabulary_fails_validation() {
        let vectorizer = CountVectorizer::fit::<&str>(&[]);
        assert!(vectorizer.validate().is_err());
    }

    #[test]
    fn json_round_trip_preserves_vocabulary() {
        let vectorizer = CountVectorizer::fit(&["one two three"]);
        let json = serde_json::to_string(&vectorizer).unwrap();
        let restored: CountVectorizer = serde_json::from_str(&json).unwrap();
        restored.validate().unwrap();
        assert_eq!(restored.vocabulary, vectorizer.vocabulary);
        assert_eq!(restored.model_version, VECTORIZER_VERSION);
    }
}
