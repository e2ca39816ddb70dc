use super::*;
use tempfile::tempdir;

fn scratch_store(dir: &Path) -> Store {
    Store::at_path(dir.join("test.db"))
}

fn sentiment_draft() -> ModelDraft {
    ModelDraft {
        name: "Sentiment".to_string(),
        data_field: "review".to_string(),
        labels: "pos,neg".to_string(),
    }
}

#[test]
fn create_and_fetch_model_round_trip() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());

    let id = store.create_model(&sentiment_draft()).unwrap();
    assert_eq!(id, 1);

    let model = store.get_model(id).unwrap();
    assert_eq!(model.name, "Sentiment");
    assert_eq!(model.data_field, "review");
    assert_eq!(model.label_list(), vec!["pos", "neg"]);

    let listed = store.list_models().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[test]
fn get_model_reports_missing_id() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());
    let err = store.get_model(42).unwrap_err();
    assert!(matches!(err, StoreError::ModelNotFound(42)));
}

#[test]
fn duplicate_model_names_are_permitted() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());
    let first = store.create_model(&sentiment_draft()).unwrap();
    let second = store.create_model(&sentiment_draft()).unwrap();
    assert_ne!(first, second);
    assert_eq!(store.list_models().unwrap().len(), 2);
}

#[test]
fn label_list_trims_and_drops_empty_entries() {
    let model = ModelRecord {
        id: 1,
        name: "m".to_string(),
        data_field: "f".to_string(),
        labels: " pos , neg ,, ".to_string(),
    };
    assert_eq!(model.label_list(), vec!["pos", "neg"]);
}

#[test]
fn examples_are_listed_in_insertion_order() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());
    let id = store.create_model(&sentiment_draft()).unwrap();

    store.add_example(id, "great product", "pos").unwrap();
    store.add_example(id, "terrible", "neg").unwrap();

    let examples = store.examples_for_model(id).unwrap();
    assert_eq!(examples.len(), 2);
    assert_eq!(examples[0].data_value, "great product");
    assert_eq!(examples[0].label, "pos");
    assert_eq!(examples[1].data_value, "terrible");
}

#[test]
fn logged_prediction_starts_with_empty_feedback() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());
    let id = store.create_model(&sentiment_draft()).unwrap();

    let prediction_id = store.log_prediction(id, "great", "pos").unwrap();
    let record = store.get_prediction(prediction_id).unwrap();
    assert_eq!(record.model_id, id);
    assert_eq!(record.input_text, "great");
    assert_eq!(record.predicted_label, "pos");
    assert!(record.is_correct.is_none());
    assert!(record.true_label.is_none());
    assert!(record.created_at > 0);
}

#[test]
fn feedback_sets_both_fields() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());
    let id = store.create_model(&sentiment_draft()).unwrap();
    let prediction_id = store.log_prediction(id, "meh", "pos").unwrap();

    store
        .set_prediction_feedback(prediction_id, false, "neg")
        .unwrap();

    let record = store.get_prediction(prediction_id).unwrap();
    assert_eq!(record.is_correct, Some(false));
    assert_eq!(record.true_label.as_deref(), Some("neg"));
}

#[test]
fn feedback_on_missing_prediction_fails() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());
    let err = store.set_prediction_feedback(7, true, "pos").unwrap_err();
    assert!(matches!(err, StoreError::PredictionNotFound(7)));
}

#[test]
fn combined_rows_union_original_and_feedback() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());
    let id = store.create_model(&sentiment_draft()).unwrap();

    store.add_example(id, "great product", "pos").unwrap();
    store.add_example(id, "terrible", "neg").unwrap();

    // One judged prediction contributes a feedback row; one unjudged does not.
    let judged = store.log_prediction(id, "awful", "pos").unwrap();
    store.set_prediction_feedback(judged, false, "neg").unwrap();
    store.log_prediction(id, "fine", "pos").unwrap();

    let rows = store.combined_rows(id).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].source, DatasetSource::OriginalTraining);
    assert_eq!(rows[1].source, DatasetSource::OriginalTraining);
    assert_eq!(rows[2].source, DatasetSource::UserFeedback);
    assert_eq!(rows[2].data_value, "awful");
    assert_eq!(rows[2].label, "neg");
}

#[test]
fn wipe_resets_identifier_counters() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());

    let first = store.create_model(&sentiment_draft()).unwrap();
    store.add_example(first, "great", "pos").unwrap();
    store.log_prediction(first, "great", "pos").unwrap();
    assert_eq!(first, 1);

    store.wipe_all().unwrap();
    assert!(store.list_models().unwrap().is_empty());

    let next = store.create_model(&sentiment_draft()).unwrap();
    assert_eq!(next, 1);
    assert!(store.examples_for_model(next).unwrap().is_empty());
}

#[test]
fn wipe_on_fresh_database_is_a_no_op() {
    let dir = tempdir().unwrap();
    let store = scratch_store(dir.path());
    store.wipe_all().unwrap();
    assert!(store.list_models().unwrap().is_empty());
}
