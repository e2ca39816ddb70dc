//! Fitting of the vectorizer/classifier pair from a labeled dataset.

use std::collections::BTreeSet;

use thiserror::Error;

use super::ArtifactPair;
use super::bayes::{CLASSIFIER_VERSION, MultinomialBayes};
use super::vectorizer::CountVectorizer;

/// Training options for the text-classification pipeline.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Additive smoothing applied to token counts.
    pub smoothing: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self { smoothing: 1.0 }
    }
}

/// In-memory training table: parallel input and label columns.
#[derive(Debug, Clone, Default)]
pub struct TrainDataset {
    pub inputs: Vec<String>,
    pub labels: Vec<String>,
}

/// Data errors that abort a training call before anything is written.
#[derive(Debug, Error)]
pub enum TrainError {
    /// The training table has no rows.
    #[error("Cannot train on an empty dataset")]
    EmptySet,
    /// The input and label columns have different lengths.
    #[error("Mismatched training columns ({inputs} inputs, {labels} labels)")]
    MismatchedColumns { inputs: usize, labels: usize },
    /// No input contained a single qualifying token.
    #[error("Training inputs produced an empty vocabulary")]
    EmptyVocabulary,
    /// An option value is outside its valid range.
    #[error("Invalid smoothing {0} (expected > 0)")]
    InvalidSmoothing(f64),
}

/// Fit the vectorizer and classifier on a labeled dataset.
///
/// The vocabulary and the class list are rebuilt from scratch from this call's
/// rows alone; nothing carries over from a previous fit.
pub fn train_text_classifier(
    dataset: &TrainDataset,
    options: &TrainOptions,
) -> Result<ArtifactPair, TrainError> {
    if dataset.inputs.is_empty() || dataset.labels.is_empty() {
        return Err(TrainError::EmptySet);
    }
    if dataset.inputs.len() != dataset.labels.len() {
        return Err(TrainError::MismatchedColumns {
            inputs: dataset.inputs.len(),
            labels: dataset.labels.len(),
        });
    }
    if !(options.smoothing > 0.0) {
        return Err(TrainError::InvalidSmoothing(options.smoothing));
    }

    let vectorizer = CountVectorizer::fit(&dataset.inputs);
    if vectorizer.vocabulary_len() == 0 {
        return Err(TrainError::EmptyVocabulary);
    }

    let classes: Vec<String> = dataset
        .labels
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let class_index = |label: &str| {
        classes
            .binary_search_by(|candidate| candidate.as_str().cmp(label))
            .expect("every label is a class")
    };

    let n_classes = classes.len();
    let n_features = vectorizer.vocabulary_len();
    let mut class_counts = vec![0.0f64; n_classes];
    let mut token_counts = vec![vec![0.0f64; n_features]; n_classes];

    for (input, label) in dataset.inputs.iter().zip(&dataset.labels) {
        let class_idx = class_index(label);
        class_counts[class_idx] += 1.0;
        let counts = vectorizer.transform(input);
        for (total, count) in token_counts[class_idx].iter_mut().zip(&counts) {
            *total += count;
        }
    }

    let total_rows: f64 = class_counts.iter().sum();
    let class_log_prior = class_counts
        .iter()
        .map(|count| count.ln() - total_rows.ln())
        .collect();

    let alpha = options.smoothing;
    let feature_log_prob = token_counts
        .iter()
        .map(|per_token| {
            let class_total: f64 = per_token.iter().sum();
            let denominator = (class_total + alpha * n_features as f64).ln();
            per_token
                .iter()
                .map(|count| (count + alpha).ln() - denominator)
                .collect()
        })
        .collect();

    let classifier = MultinomialBayes {
        model_version: CLASSIFIER_VERSION,
        smoothing: alpha,
        classes,
        class_log_prior,
        feature_log_prob,
    };

    Ok(ArtifactPair {
        vectorizer,
        classifier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dataset_is_a_data_error() {
        let err = train_text_classifier(&TrainDataset::default(), &TrainOptions::default())
            .unwrap_err();
        assert!(matches!(err, TrainError::EmptySet));
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let dataset = TrainDataset {
            inputs: vec!["one".to_string(), "two".to_string()],
            labels: vec!["a".to_string()],
        };
        let err = train_text_classifier(&dataset, &TrainOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            TrainError::MismatchedColumns {
                inputs: 2,
                labels: 1
            }
        ));
    }

    #[test]
    fn tokenless_inputs_are_a_data_error() {
        let dataset = TrainDataset {
            inputs: vec!["a b c".to_string(), "! ?".to_string()],
            labels: vec!["x".to_string(), "y".to_string()],
        };
        let err = train_text_classifier(&dataset, &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, TrainError::EmptyVocabulary));
    }

    #[test]
    fn single_example_predicts_its_label_for_any_input() {
        let dataset = TrainDataset {
            inputs: vec!["great product".to_string()],
            labels: vec!["pos".to_string()],
        };
        let pair = train_text_classifier(&dataset, &TrainOptions::default()).unwrap();
        assert_eq!(pair.predict("great"), "pos");
        assert_eq!(pair.predict("anything else entirely"), "pos");
        assert_eq!(pair.predict(""), "pos");
    }

    #[test]
    fn fitted_pair_passes_validation() {
        let dataset = TrainDataset {
            inputs: vec!["great product".to_string(), "terrible".to_string()],
            labels: vec!["pos".to_string(), "neg".to_string()],
        };
        let pair = train_text_classifier(&dataset, &TrainOptions::default()).unwrap();
        pair.vectorizer.validate().unwrap();
        pair.classifier.validate().unwrap();
        assert_eq!(pair.classifier.classes, vec!["neg", "pos"]);
        assert_eq!(
            pair.classifier.feature_log_prob[0].len(),
            pair.vectorizer.vocabulary_len()
        );
    }

    #[test]
    fn sentiment_round_trip_matches_training_labels() {
        let dataset = TrainDataset {
            inputs: vec!["great product".to_string(), "terrible".to_string()],
            labels: vec!["pos".to_string(), "neg".to_string()],
        };
        let pair = train_text_classifier(&dataset, &TrainOptions::default()).unwrap();
        assert_eq!(pair.predict("great"), "pos");
        assert_eq!(pair.predict("terrible"), "neg");
    }

    #[test]
    fn invalid_smoothing_is_rejected() {
        let dataset = TrainDataset {
            inputs: vec!["fine".to_string()],
            labels: vec!["ok".to_string()],
        };
        let err = train_text_classifier(&dataset, &TrainOptions { smoothing: 0.0 }).unwrap_err();
        assert!(matches!(err, TrainError::InvalidSmoothing(_)));
    }
}
