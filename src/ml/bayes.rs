//! Multinomial naive-Bayes classifier over token-count features.

use serde::{Deserialize, Serialize};

/// Current serialization format version for [`MultinomialBayes`].
pub const CLASSIFIER_VERSION: i64 = 1;

/// Fitted multinomial naive-Bayes model.
///
/// Log probabilities are precomputed at fit time; prediction is a single
/// pass of `log prior + counts · log likelihoods` per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialBayes {
    /// Serialization format version.
    pub model_version: i64,
    /// Additive smoothing applied to token counts at fit time.
    pub smoothing: f64,
    /// Ordered list of class labels.
    pub classes: Vec<String>,
    /// Per-class log prior, same order as `classes`.
    pub class_log_prior: Vec<f64>,
    /// Per-class, per-feature conditional log likelihood.
    /// Shape: `[n_classes][n_features]`.
    pub feature_log_prob: Vec<Vec<f64>>,
}

impl MultinomialBayes {
    /// Validate structural invariants of a (possibly deserialized) model.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("Model must contain at least 1 class".to_string());
        }
        if self.class_log_prior.len() != self.classes.len() {
            return Err("class_log_prior length must match classes length".to_string());
        }
        if self.feature_log_prob.len() != self.classes.len() {
            return Err("feature_log_prob row count must match classes length".to_string());
        }
        let n_features = self.feature_log_prob[0].len();
        for (class_idx, row) in self.feature_log_prob.iter().enumerate() {
            if row.len() != n_features {
                return Err(format!(
                    "Class {class_idx} has {} feature likelihoods but expected {n_features}",
                    row.len()
                ));
            }
        }
        if !(self.smoothing > 0.0) {
            return Err(format!("Invalid smoothing {}", self.smoothing));
        }
        Ok(())
    }

    /// Unnormalized per-class log scores for a count vector.
    pub fn predict_log_scores(&self, counts: &[f64]) -> Vec<f64> {
        self.classes
            .iter()
            .enumerate()
            .map(|(class_idx, _)| {
                let likelihoods = &self.feature_log_prob[class_idx];
                let mut score = self.class_log_prior[class_idx];
                for (count, log_prob) in counts.iter().zip(likelihoods) {
                    if *count != 0.0 {
                        score += count * log_prob;
                    }
                }
                score
            })
            .collect()
    }

    /// Index of the most probable class; ties resolve to the lowest index.
    pub fn predict_class_index(&self, counts: &[f64]) -> usize {
        argmax(&self.predict_log_scores(counts))
    }

    /// Label of the most probable class.
    pub fn predict_label(&self, counts: &[f64]) -> &str {
        &self.classes[self.predict_class_index(counts)]
    }
}

/// Index of the maximum value; the first maximum wins on ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::train::{TrainDataset, TrainOptions, train_text_classifier};

    fn fit(rows: &[(&str, &str)]) -> crate::ml::ArtifactPair {
        let dataset = TrainDataset {
            inputs: rows.iter().map(|(text, _)| text.to_string()).collect(),
            labels: rows.iter().map(|(_, label)| label.to_string()).collect(),
        };
        train_text_classifier(&dataset, &TrainOptions::default()).unwrap()
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }

    #[test]
    fn obvious_two_class_split_is_learned() {
        let pair = fit(&[
            ("great excellent wonderful", "pos"),
            ("awful terrible horrible", "neg"),
        ]);
        assert_eq!(pair.predict("excellent wonderful"), "pos");
        assert_eq!(pair.predict("terrible awful"), "neg");
    }

    #[test]
    fn unseen_tokens_do_not_zero_out_a_class() {
        let pair = fit(&[
            ("good fine", "pos"),
            ("good great", "pos"),
            ("bad bad", "neg"),
        ]);
        // "novel" is out of vocabulary; scores stay finite and the class
        // prior decides (two pos rows against one neg row).
        let counts = pair.vectorizer.transform("novel");
        let scores = pair.classifier.predict_log_scores(&counts);
        assert!(scores.iter().all(|score| score.is_finite()));
        assert_eq!(pair.predict("novel"), "pos");
    }

    #[test]
    fn classes_are_sorted_and_ties_pick_the_first() {
        let pair = fit(&[("same text", "zebra"), ("same text", "apple")]);
        assert_eq!(pair.classifier.classes, vec!["apple", "zebra"]);
        // Identical evidence for both classes: the first sorted class wins.
        assert_eq!(pair.predict("same text"), "apple");
    }

    #[test]
    fn validation_rejects_ragged_likelihood_rows() {
        let model = MultinomialBayes {
            model_version: CLASSIFIER_VERSION,
            smoothing: 1.0,
            classes: vec!["a".to_string(), "b".to_string()],
            class_log_prior: vec![0.0, 0.0],
            feature_log_prob: vec![vec![0.0, 0.0], vec![0.0]],
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let pair = fit(&[("great stuff", "pos"), ("bad stuff", "neg")]);
        let json = serde_json::to_string(&pair.classifier).unwrap();
        let restored: MultinomialBayes = serde_json::from_str(&json).unwrap();
        restored.validate().unwrap();
        let counts = pair.vectorizer.transform("great");
        assert_eq!(
            restored.predict_label(&counts),
            pair.classifier.predict_label(&counts)
        );
    }
}
