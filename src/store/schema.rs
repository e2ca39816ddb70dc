use rusqlite::Connection;

use super::StoreError;

pub(super) fn apply_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )?;
    Ok(())
}

pub(super) fn apply_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS models (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            data_field TEXT NOT NULL,
            labels TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS training_examples (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model_id INTEGER NOT NULL,
            data_value TEXT NOT NULL,
            label TEXT NOT NULL,
            FOREIGN KEY (model_id) REFERENCES models (id)
         );
         CREATE INDEX IF NOT EXISTS idx_training_examples_model_id
            ON training_examples (model_id);
         CREATE TABLE IF NOT EXISTS prediction_feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model_id INTEGER NOT NULL,
            input_text TEXT NOT NULL,
            predicted_label TEXT NOT NULL,
            is_correct INTEGER,
            true_label TEXT,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (model_id) REFERENCES models (id)
         );
         CREATE INDEX IF NOT EXISTS idx_prediction_feedback_model_id
            ON prediction_feedback (model_id);",
    )?;
    Ok(())
}

/// Clear the `sqlite_sequence` counters for all three tables.
///
/// The counter table only exists once an AUTOINCREMENT insert has happened,
/// so its absence means the counters are already at their initial state.
pub(super) fn reset_sequences(conn: &Connection) -> Result<(), StoreError> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='sqlite_sequence'",
        [],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Ok(());
    }
    conn.execute(
        "DELETE FROM sqlite_sequence
         WHERE name IN ('models', 'training_examples', 'prediction_feedback')",
        [],
    )?;
    Ok(())
}
