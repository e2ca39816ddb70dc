//! SQLite persistence for model definitions, training examples and
//! prediction/feedback records.
//!
//! Every operation opens its own short-lived connection, performs its work and
//! releases it; no handle is shared across requests. Schema and pragmas are
//! applied on every open so a missing database file is created on first use.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use thiserror::Error;

mod schema;
#[cfg(test)]
mod tests;

use crate::app_dirs;

/// Errors returned by persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The application directory for the database could not be resolved.
    #[error("App directory error: {0}")]
    AppDirs(#[from] app_dirs::AppDirError),
    /// A database open, statement or transaction failed.
    #[error("Database query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    /// No model definition exists with the given id.
    #[error("Model {0} not found")]
    ModelNotFound(i64),
    /// No prediction record exists with the given id.
    #[error("Prediction {0} not found")]
    PredictionNotFound(i64),
}

/// Fields supplied when creating a model definition.
#[derive(Debug, Clone)]
pub struct ModelDraft {
    /// Display name; not unique (duplicates collide on the artifact directory).
    pub name: String,
    /// Name of the input-data field shown on data-entry forms.
    pub data_field: String,
    /// Comma-separated ordered list of permitted labels.
    pub labels: String,
}

/// A stored model definition. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct ModelRecord {
    pub id: i64,
    pub name: String,
    pub data_field: String,
    pub labels: String,
}

impl ModelRecord {
    /// The declared label list, split and trimmed, empty entries dropped.
    pub fn label_list(&self) -> Vec<&str> {
        self.labels
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .collect()
    }
}

/// One stored (input, label) pair belonging to a model.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingExample {
    pub id: i64,
    pub model_id: i64,
    pub data_value: String,
    pub label: String,
}

/// A logged prediction with optional feedback fields.
///
/// `is_correct` and `true_label` are either both `None` (no feedback yet) or
/// both `Some` (feedback recorded, terminal).
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub model_id: i64,
    pub input_text: String,
    pub predicted_label: String,
    pub is_correct: Option<bool>,
    pub true_label: Option<String>,
    pub created_at: i64,
}

/// Provenance tag for a combined-dataset row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSource {
    /// Entered directly through the add-data form.
    OriginalTraining,
    /// Confirmed or corrected through the feedback loop.
    UserFeedback,
}

impl DatasetSource {
    /// The fixed tag used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSource::OriginalTraining => "Original Training",
            DatasetSource::UserFeedback => "User Feedback",
        }
    }
}

/// One row of the combined dataset used for retraining and export.
#[derive(Debug, Clone)]
pub struct DatasetRow {
    pub data_value: String,
    pub label: String,
    pub source: DatasetSource,
}

/// Handle identifying the database file. Cheap to clone; holds no connection.
#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    /// Open the store at the default application database path.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::at_path(app_dirs::database_path()?))
    }

    /// Open the store at an explicit database path.
    pub fn at_path(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Path of the underlying database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let connection = Connection::open(&self.db_path)?;
        schema::apply_pragmas(&connection)?;
        schema::apply_schema(&connection)?;
        Ok(connection)
    }

    /// Insert a model definition and return its new id.
    pub fn create_model(&self, draft: &ModelDraft) -> Result<i64, StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO models (name, data_field, labels) VALUES (?1, ?2, ?3)",
            params![draft.name, draft.data_field, draft.labels],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List all model definitions in creation order.
    pub fn list_models(&self) -> Result<Vec<ModelRecord>, StoreError> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT id, name, data_field, labels FROM models ORDER BY id")?;
        let rows = stmt
            .query_map([], map_model_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Fetch one model definition by id.
    pub fn get_model(&self, model_id: i64) -> Result<ModelRecord, StoreError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT id, name, data_field, labels FROM models WHERE id = ?1",
            params![model_id],
            map_model_row,
        )
        .optional()?
        .ok_or(StoreError::ModelNotFound(model_id))
    }

    /// Append a training example for a model.
    pub fn add_example(
        &self,
        model_id: i64,
        data_value: &str,
        label: &str,
    ) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO training_examples (model_id, data_value, label) VALUES (?1, ?2, ?3)",
            params![model_id, data_value, label],
        )?;
        Ok(())
    }

    /// List a model's directly-entered training examples in insertion order.
    pub fn examples_for_model(&self, model_id: i64) -> Result<Vec<TrainingExample>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, model_id, data_value, label FROM training_examples
             WHERE model_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![model_id], |row| {
                Ok(TrainingExample {
                    id: row.get(0)?,
                    model_id: row.get(1)?,
                    data_value: row.get(2)?,
                    label: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Log a prediction with empty feedback fields and return the record id.
    pub fn log_prediction(
        &self,
        model_id: i64,
        input_text: &str,
        predicted_label: &str,
    ) -> Result<i64, StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO prediction_feedback (model_id, input_text, predicted_label, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![model_id, input_text, predicted_label, now_epoch_seconds()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Fetch one prediction record by id.
    pub fn get_prediction(&self, prediction_id: i64) -> Result<PredictionRecord, StoreError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT id, model_id, input_text, predicted_label, is_correct, true_label, created_at
             FROM prediction_feedback WHERE id = ?1",
            params![prediction_id],
            map_prediction_row,
        )
        .optional()?
        .ok_or(StoreError::PredictionNotFound(prediction_id))
    }

    /// Set both feedback fields on a prediction record.
    pub fn set_prediction_feedback(
        &self,
        prediction_id: i64,
        is_correct: bool,
        true_label: &str,
    ) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let updated = conn.execute(
            "UPDATE prediction_feedback SET is_correct = ?1, true_label = ?2 WHERE id = ?3",
            params![is_correct as i64, true_label, prediction_id],
        )?;
        if updated == 0 {
            return Err(StoreError::PredictionNotFound(prediction_id));
        }
        Ok(())
    }

    /// The combined dataset for a model: original examples first, then
    /// feedback rows that carry a true label.
    pub fn combined_rows(&self, model_id: i64) -> Result<Vec<DatasetRow>, StoreError> {
        let conn = self.connect()?;
        let mut rows = Vec::new();

        let mut stmt = conn.prepare(
            "SELECT data_value, label FROM training_examples WHERE model_id = ?1 ORDER BY id",
        )?;
        let original = stmt.query_map(params![model_id], |row| {
            Ok(DatasetRow {
                data_value: row.get(0)?,
                label: row.get(1)?,
                source: DatasetSource::OriginalTraining,
            })
        })?;
        for row in original {
            rows.push(row?);
        }

        let mut stmt = conn.prepare(
            "SELECT input_text, true_label FROM prediction_feedback
             WHERE model_id = ?1 AND true_label IS NOT NULL ORDER BY id",
        )?;
        let feedback = stmt.query_map(params![model_id], |row| {
            Ok(DatasetRow {
                data_value: row.get(0)?,
                label: row.get(1)?,
                source: DatasetSource::UserFeedback,
            })
        })?;
        for row in feedback {
            rows.push(row?);
        }

        Ok(rows)
    }

    /// Delete every model, example and prediction record, and reset the
    /// auto-increment counters so freshly-created rows start at id 1 again.
    pub fn wipe_all(&self) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM training_examples", [])?;
        tx.execute("DELETE FROM prediction_feedback", [])?;
        tx.execute("DELETE FROM models", [])?;
        schema::reset_sequences(&tx)?;
        tx.commit()?;
        Ok(())
    }
}

fn map_model_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModelRecord> {
    Ok(ModelRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        data_field: row.get(2)?,
        labels: row.get(3)?,
    })
}

fn map_prediction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PredictionRecord> {
    let is_correct: Option<i64> = row.get(4)?;
    Ok(PredictionRecord {
        id: row.get(0)?,
        model_id: row.get(1)?,
        input_text: row.get(2)?,
        predicted_label: row.get(3)?,
        is_correct: is_correct.map(|flag| flag != 0),
        true_label: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs() as i64
}
