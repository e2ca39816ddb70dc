//! Server-side HTML rendering for the form-driven pages.
//!
//! Pages are assembled as plain strings; every user-supplied value goes
//! through [`escape_html`] before insertion.

use crate::service::{PredictionOutcome, TrainReport};
use crate::store::{ModelRecord, TrainingExample};

/// Escape a value for safe insertion into HTML text or attributes.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title} · labelforge</title>\n\
         <style>body{{font-family:sans-serif;max-width:52rem;margin:2rem auto;padding:0 1rem}}\
         table{{border-collapse:collapse}}td,th{{border:1px solid #999;padding:0.3rem 0.6rem}}\
         .message{{background:#eef;padding:0.6rem;border:1px solid #99c}}</style>\n\
         </head>\n<body>\n<p><a href=\"/\">Models</a></p>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
        body = body,
    )
}

/// The model list landing page.
pub fn index(models: &[ModelRecord]) -> String {
    let mut body = String::new();
    if models.is_empty() {
        body.push_str("<p>No models defined yet.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for model in models {
            body.push_str(&format!(
                "<li><a href=\"/model/{id}\">{name}</a>: field <code>{field}</code>, labels <code>{labels}</code></li>\n",
                id = model.id,
                name = escape_html(&model.name),
                field = escape_html(&model.data_field),
                labels = escape_html(&model.labels),
            ));
        }
        body.push_str("</ul>\n");
    }
    body.push_str("<p><a href=\"/create_model\">Create a model</a></p>\n");
    body.push_str(
        "<form method=\"post\" action=\"/delete_all\" \
         onsubmit=\"return confirm('Delete all models and data?')\">\n\
         <button type=\"submit\">Delete everything</button>\n</form>\n",
    );
    layout("Models", &body)
}

/// The create-model form.
pub fn create_model() -> String {
    let body = "<form method=\"post\" action=\"/create_model\">\n\
         <p><label>Name <input name=\"name\" required></label></p>\n\
         <p><label>Data field <input name=\"data_field\" required></label></p>\n\
         <p><label>Labels (comma-separated) <input name=\"labels\" required></label></p>\n\
         <button type=\"submit\">Create</button>\n</form>\n";
    layout("Create model", body)
}

/// The model detail page with its training data.
pub fn model_detail(model: &ModelRecord, examples: &[TrainingExample]) -> String {
    let mut body = format!(
        "<p>Input field: <code>{field}</code><br>Labels: <code>{labels}</code></p>\n\
         <p>\n<a href=\"/add_data/{id}\">Add data</a> |\n<a href=\"/model/{id}/train\">Train</a> |\n\
         <a href=\"/model/{id}/predict\">Predict</a> |\n<a href=\"/download_data/{id}\">Download dataset</a>\n</p>\n",
        field = escape_html(&model.data_field),
        labels = escape_html(&model.labels),
        id = model.id,
    );
    if examples.is_empty() {
        body.push_str("<p>No training examples yet.</p>\n");
    } else {
        body.push_str(&format!(
            "<table>\n<tr><th>{}</th><th>Label</th></tr>\n",
            escape_html(&model.data_field)
        ));
        for example in examples {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                escape_html(&example.data_value),
                escape_html(&example.label),
            ));
        }
        body.push_str("</table>\n");
    }
    layout(&model.name, &body)
}

/// The add-example form with a dropdown of the declared labels.
pub fn add_data(model: &ModelRecord) -> String {
    let mut options = String::new();
    for label in model.label_list() {
        let escaped = escape_html(label);
        options.push_str(&format!(
            "<option value=\"{escaped}\">{escaped}</option>\n"
        ));
    }
    let body = format!(
        "<form method=\"post\" action=\"/add_data/{id}\">\n\
         <p><label>{field} <input name=\"data_value\" required></label></p>\n\
         <p><label>Label <select name=\"label\">\n{options}</select></label></p>\n\
         <button type=\"submit\">Add</button>\n</form>\n\
         <p><a href=\"/model/{id}\">Back to {name}</a></p>\n",
        id = model.id,
        field = escape_html(&model.data_field),
        name = escape_html(&model.name),
    );
    layout("Add data", &body)
}

/// The training page, optionally with the outcome of a just-run training.
pub fn train(model: &ModelRecord, message: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(message) = message {
        body.push_str(&format!(
            "<p class=\"message\">{}</p>\n",
            escape_html(message)
        ));
    }
    body.push_str(&format!(
        "<form method=\"post\" action=\"/model/{id}/train\">\n\
         <button type=\"submit\">Train {name}</button>\n</form>\n\
         <p><a href=\"/model/{id}\">Back to {name}</a></p>\n",
        id = model.id,
        name = escape_html(&model.name),
    ));
    layout("Train", &body)
}

/// Human-readable summary line for a finished training run.
pub fn train_success_message(model: &ModelRecord, report: &TrainReport) -> String {
    format!(
        "Model '{}' training completed successfully ({} rows, {} classes, {} tokens).",
        model.name, report.rows, report.classes, report.vocabulary
    )
}

/// What the predict page shows besides the input form.
pub enum PredictView<'a> {
    /// Nothing submitted yet.
    Blank,
    /// A prediction succeeded; offer the feedback form.
    Predicted {
        input_text: &'a str,
        outcome: &'a PredictionOutcome,
    },
    /// The request failed in a way the page reports inline.
    Message(&'a str),
}

/// The prediction page with an optional result and feedback form.
pub fn predict(model: &ModelRecord, view: &PredictView<'_>) -> String {
    let mut body = String::new();
    match view {
        PredictView::Blank => {}
        PredictView::Message(message) => {
            body.push_str(&format!(
                "<p class=\"message\">{}</p>\n",
                escape_html(message)
            ));
        }
        PredictView::Predicted {
            input_text,
            outcome,
        } => {
            body.push_str(&format!(
                "<p class=\"message\">Predicted label for \u{201c}{input}\u{201d}: <strong>{label}</strong></p>\n",
                input = escape_html(input_text),
                label = escape_html(&outcome.label),
            ));
            body.push_str(&feedback_form(model, outcome.prediction_id));
        }
    }
    body.push_str(&format!(
        "<form method=\"post\" action=\"/model/{id}/predict\">\n\
         <p><label>{field} <input name=\"text\" required></label></p>\n\
         <button type=\"submit\">Predict</button>\n</form>\n\
         <p><a href=\"/model/{id}\">Back to {name}</a></p>\n",
        id = model.id,
        field = escape_html(&model.data_field),
        name = escape_html(&model.name),
    ));
    layout("Predict", &body)
}

fn feedback_form(model: &ModelRecord, prediction_id: i64) -> String {
    let mut label_options = String::new();
    for label in model.label_list() {
        let escaped = escape_html(label);
        label_options.push_str(&format!(
            "<option value=\"{escaped}\">{escaped}</option>\n"
        ));
    }
    format!(
        "<form method=\"post\" action=\"/feedback/{prediction_id}/{model_id}\">\n\
         <p>Was this prediction correct?</p>\n\
         <p><label><input type=\"radio\" name=\"action\" value=\"correct\" checked> Correct</label>\n\
         <label><input type=\"radio\" name=\"action\" value=\"incorrect\"> Incorrect, true label:</label>\n\
         <select name=\"true_label\">\n{label_options}</select></p>\n\
         <button type=\"submit\">Submit feedback</button>\n</form>\n",
        prediction_id = prediction_id,
        model_id = model.id,
    )
}

/// A one-paragraph page used for generic boundary errors.
pub fn message_page(title: &str, text: &str) -> String {
    layout(title, &format!("<p class=\"message\">{}</p>\n", escape_html(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentiment() -> ModelRecord {
        ModelRecord {
            id: 3,
            name: "Sentiment".to_string(),
            data_field: "review".to_string(),
            labels: "pos,neg".to_string(),
        }
    }

    #[test]
    fn escape_covers_html_metacharacters() {
        assert_eq!(
            escape_html("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn index_lists_models_with_links() {
        let html = index(&[sentiment()]);
        assert!(html.contains("<a href=\"/model/3\">Sentiment</a>"));
        assert!(html.contains("/delete_all"));
    }

    #[test]
    fn model_values_are_escaped_in_detail_page() {
        let mut model = sentiment();
        model.name = "<script>".to_string();
        let examples = vec![TrainingExample {
            id: 1,
            model_id: 3,
            data_value: "a & b".to_string(),
            label: "pos".to_string(),
        }];
        let html = model_detail(&model, &examples);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn add_data_offers_declared_labels() {
        let html = add_data(&sentiment());
        assert!(html.contains("<option value=\"pos\">pos</option>"));
        assert!(html.contains("<option value=\"neg\">neg</option>"));
        assert!(html.contains("action=\"/add_data/3\""));
    }

    #[test]
    fn predict_page_shows_feedback_form_after_prediction() {
        let outcome = PredictionOutcome {
            label: "pos".to_string(),
            prediction_id: 11,
        };
        let html = predict(
            &sentiment(),
            &PredictView::Predicted {
                input_text: "great",
                outcome: &outcome,
            },
        );
        assert!(html.contains("action=\"/feedback/11/3\""));
        assert!(html.contains("<strong>pos</strong>"));
    }

    #[test]
    fn blank_predict_page_has_no_feedback_form() {
        let html = predict(&sentiment(), &PredictView::Blank);
        assert!(!html.contains("/feedback/"));
    }
}
