//! Workflow orchestration tying the store, the training pipeline and the
//! artifact layer together: train on the combined dataset, predict and log,
//! apply feedback, export.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::app_dirs::{self, AppDirError, DATABASE_FILE_NAME};
use crate::artifacts::{self, ArtifactError};
use crate::export;
use crate::ml::train::{TrainDataset, TrainError, TrainOptions, train_text_classifier};
use crate::store::{ModelRecord, Store, StoreError};

/// Errors surfaced by the workflow operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The application directories could not be prepared.
    #[error("App directory error: {0}")]
    AppDirs(#[from] AppDirError),
    /// A persistence operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Training aborted on a data error.
    #[error(transparent)]
    Train(#[from] TrainError),
    /// Loading or saving the artifact pair failed.
    #[error(transparent)]
    Artifacts(#[from] ArtifactError),
    /// The prediction record was already judged; feedback is terminal.
    #[error("Prediction {0} already has feedback recorded")]
    FeedbackAlreadyRecorded(i64),
    /// The model has no rows to export.
    #[error("No data to export")]
    NoExportData,
}

/// Summary of one successful training run, for the UI message.
#[derive(Debug, Clone, Copy)]
pub struct TrainReport {
    /// Rows in the combined training table.
    pub rows: usize,
    /// Distinct labels observed.
    pub classes: usize,
    /// Tokens in the fitted vocabulary.
    pub vocabulary: usize,
}

/// Result of a successful prediction request.
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    /// The predicted label.
    pub label: String,
    /// Identifier of the logged prediction record, for the feedback form.
    pub prediction_id: i64,
}

/// A user's judgment of one prediction.
#[derive(Debug, Clone)]
pub enum FeedbackVerdict {
    /// The predicted label was right; it becomes the true label.
    Correct,
    /// The predicted label was wrong; the supplied label is the true one.
    Incorrect { true_label: String },
}

/// Rendered export ready to be served as a download.
#[derive(Debug, Clone)]
pub struct DatasetExport {
    pub file_name: String,
    pub content: String,
}

/// Handle bundling the store with the artifact root.
///
/// Cheap to construct per request; holds paths only, never an open
/// connection or file handle.
#[derive(Debug, Clone)]
pub struct App {
    store: Store,
    models_root: PathBuf,
}

impl App {
    /// Open the application at the default platform directories.
    pub fn open_default() -> Result<Self, ServiceError> {
        Ok(Self {
            store: Store::open_default()?,
            models_root: app_dirs::models_dir()?,
        })
    }

    /// Open the application under an explicit root directory.
    pub fn with_root(root: &Path) -> Result<Self, ServiceError> {
        let models_root = root.join("models");
        std::fs::create_dir_all(&models_root).map_err(|source| AppDirError::CreateDir {
            path: models_root.clone(),
            source,
        })?;
        Ok(Self {
            store: Store::at_path(root.join(DATABASE_FILE_NAME)),
            models_root,
        })
    }

    /// The underlying persistence handle.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Train a model on its combined dataset and persist the artifact pair.
    ///
    /// Reads original examples plus feedback-confirmed ones, exactly the rows
    /// the export shows. Data errors abort before anything is written.
    pub fn train_model(&self, model: &ModelRecord) -> Result<TrainReport, ServiceError> {
        let rows = self.store.combined_rows(model.id)?;
        let mut dataset = TrainDataset::default();
        for row in rows {
            dataset.inputs.push(row.data_value);
            dataset.labels.push(row.label);
        }

        let pair = train_text_classifier(&dataset, &TrainOptions::default())?;
        artifacts::save_artifacts(&self.models_root, &model.name, &pair)?;

        let report = TrainReport {
            rows: dataset.inputs.len(),
            classes: pair.classifier.classes.len(),
            vocabulary: pair.vectorizer.vocabulary_len(),
        };
        tracing::info!(
            model = %model.name,
            rows = report.rows,
            classes = report.classes,
            vocabulary = report.vocabulary,
            "Training completed"
        );
        Ok(report)
    }

    /// Predict a label for the input and log the prediction record.
    pub fn predict(
        &self,
        model: &ModelRecord,
        input_text: &str,
    ) -> Result<PredictionOutcome, ServiceError> {
        let pair = artifacts::load_artifacts(&self.models_root, &model.name)?;
        let label = pair.predict(input_text).to_string();
        let prediction_id = self.store.log_prediction(model.id, input_text, &label)?;
        Ok(PredictionOutcome {
            label,
            prediction_id,
        })
    }

    /// Apply a feedback judgment to a prediction record.
    ///
    /// The input text and predicted label come from the stored record, not
    /// the submitted form. When the resulting true label is non-empty, one
    /// new training example is appended — also on confirmation, where it may
    /// duplicate an original row.
    pub fn apply_feedback(
        &self,
        model: &ModelRecord,
        prediction_id: i64,
        verdict: FeedbackVerdict,
    ) -> Result<(), ServiceError> {
        let record = self.store.get_prediction(prediction_id)?;
        if record.model_id != model.id {
            return Err(StoreError::PredictionNotFound(prediction_id).into());
        }
        if record.is_correct.is_some() || record.true_label.is_some() {
            return Err(ServiceError::FeedbackAlreadyRecorded(prediction_id));
        }

        let (is_correct, true_label) = match verdict {
            FeedbackVerdict::Correct => (true, record.predicted_label.clone()),
            FeedbackVerdict::Incorrect { true_label } => (false, true_label),
        };
        self.store
            .set_prediction_feedback(prediction_id, is_correct, &true_label)?;

        if !true_label.is_empty() && !record.input_text.is_empty() {
            self.store
                .add_example(model.id, &record.input_text, &true_label)?;
        }
        Ok(())
    }

    /// Render the combined dataset for download.
    pub fn export_dataset(&self, model: &ModelRecord) -> Result<DatasetExport, ServiceError> {
        let rows = self.store.combined_rows(model.id)?;
        if rows.is_empty() {
            return Err(ServiceError::NoExportData);
        }
        Ok(DatasetExport {
            file_name: export::export_file_name(&model.name),
            content: export::render_csv(&rows),
        })
    }
}
