//! CSV rendering of a model's combined dataset.
//!
//! The export carries one row per combined-dataset entry with a fixed source
//! tag distinguishing originally-entered data from feedback-confirmed data.

use std::borrow::Cow;

use crate::store::DatasetRow;

/// Column header of the exported file.
pub const EXPORT_HEADER: &str = "Input Text,Label,Source";

/// MIME type served with the download.
pub const EXPORT_CONTENT_TYPE: &str = "text/csv";

/// Download filename for a model's dataset export.
pub fn export_file_name(model_name: &str) -> String {
    format!("{}_dataset.csv", model_name.replace(' ', "_"))
}

/// Render the combined dataset as CSV, header first.
pub fn render_csv(rows: &[DatasetRow]) -> String {
    let mut out = String::with_capacity(EXPORT_HEADER.len() + rows.len() * 32);
    out.push_str(EXPORT_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&csv_field(&row.data_value));
        out.push(',');
        out.push_str(&csv_field(&row.label));
        out.push(',');
        out.push_str(&csv_field(row.source.as_str()));
        out.push('\n');
    }
    out
}

/// Quote a field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
