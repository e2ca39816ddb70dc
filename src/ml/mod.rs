//! Machine learning building blocks for the train/predict workflow.
//!
//! The pipeline is fixed: a token-count vectorizer feeding a multinomial
//! naive-Bayes classifier, both fitted in one training call and persisted
//! together as one artifact pair.

pub mod bayes;
pub mod train;
pub mod vectorizer;

use bayes::MultinomialBayes;
use vectorizer::CountVectorizer;

/// A fitted vectorizer and classifier produced by one training run.
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    pub vectorizer: CountVectorizer,
    pub classifier: MultinomialBayes,
}

impl ArtifactPair {
    /// Predict the most probable label for a raw input string.
    ///
    /// Tokens outside the training vocabulary contribute nothing.
    pub fn predict(&self, text: &str) -> &str {
        let counts = self.vectorizer.transform(text);
        self.classifier.predict_label(&counts)
    }
}
