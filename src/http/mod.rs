//! HTTP front end: the axum router and its form-driven handlers.
//!
//! Handlers are thin callers of the workflow contracts in [`crate::service`].
//! Missing models surface as plain-text 404s; training and prediction data
//! errors render as in-page messages; anything unexpected is logged and
//! rendered as a generic error page.

pub mod pages;

use axum::{
    Router,
    extract::{Form, Path},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::artifacts::ArtifactError;
use crate::service::{App, FeedbackVerdict, ServiceError};
use crate::store::{ModelDraft, ModelRecord, StoreError};

/// Errors leaving a handler, mapped onto HTTP responses.
#[derive(Debug, thiserror::Error)]
enum WebError {
    /// A named entity does not exist; rendered as plain text with a 404.
    #[error("{0}")]
    NotFound(String),
    /// Feedback was submitted twice for one prediction.
    #[error("Feedback already recorded")]
    Conflict,
    /// Anything else; logged and rendered as a generic error page.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            WebError::Conflict => {
                (StatusCode::CONFLICT, "Feedback already recorded").into_response()
            }
            WebError::Internal(message) => {
                tracing::error!("Request failed: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::message_page(
                        "Something went wrong",
                        "The request could not be completed. Check the server logs.",
                    )),
                )
                    .into_response()
            }
        }
    }
}

/// Classify a service error into its HTTP shape.
fn classify(error: ServiceError) -> WebError {
    match error {
        ServiceError::Store(StoreError::ModelNotFound(_)) => {
            WebError::NotFound("Model not found".to_string())
        }
        ServiceError::Store(StoreError::PredictionNotFound(_)) => {
            WebError::NotFound("Prediction not found".to_string())
        }
        ServiceError::NoExportData => WebError::NotFound("No data to export.".to_string()),
        ServiceError::FeedbackAlreadyRecorded(_) => WebError::Conflict,
        other => WebError::Internal(other.to_string()),
    }
}

fn open_app() -> Result<App, WebError> {
    App::open_default().map_err(classify)
}

fn fetch_model(app: &App, model_id: i64) -> Result<ModelRecord, WebError> {
    app.store().get_model(model_id).map_err(|err| classify(err.into()))
}

/// Build the application router.
pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/create_model", get(create_model_form).post(create_model_submit))
        .route("/model/{model_id}", get(model_detail))
        .route("/add_data/{model_id}", get(add_data_form).post(add_data_submit))
        .route("/model/{model_id}/train", get(train_page).post(train_submit))
        .route(
            "/model/{model_id}/predict",
            get(predict_page).post(predict_submit),
        )
        .route("/feedback/{prediction_id}/{model_id}", post(feedback_submit))
        .route("/download_data/{model_id}", get(download_data))
        .route("/delete_all", post(delete_all))
}

async fn index() -> Result<Html<String>, WebError> {
    let app = open_app()?;
    let models = app.store().list_models().map_err(|err| classify(err.into()))?;
    Ok(Html(pages::index(&models)))
}

async fn create_model_form() -> Html<String> {
    Html(pages::create_model())
}

#[derive(Debug, Deserialize)]
struct CreateModelForm {
    name: String,
    data_field: String,
    labels: String,
}

async fn create_model_submit(
    Form(form): Form<CreateModelForm>,
) -> Result<Redirect, WebError> {
    let app = open_app()?;
    let draft = ModelDraft {
        name: form.name,
        data_field: form.data_field,
        labels: form.labels,
    };
    let model_id = app
        .store()
        .create_model(&draft)
        .map_err(|err| classify(err.into()))?;
    Ok(Redirect::to(&format!("/model/{model_id}")))
}

async fn model_detail(Path(model_id): Path<i64>) -> Result<Html<String>, WebError> {
    let app = open_app()?;
    let model = fetch_model(&app, model_id)?;
    let examples = app
        .store()
        .examples_for_model(model_id)
        .map_err(|err| classify(err.into()))?;
    Ok(Html(pages::model_detail(&model, &examples)))
}

async fn add_data_form(Path(model_id): Path<i64>) -> Result<Html<String>, WebError> {
    let app = open_app()?;
    let model = fetch_model(&app, model_id)?;
    Ok(Html(pages::add_data(&model)))
}

#[derive(Debug, Deserialize)]
struct AddDataForm {
    data_value: String,
    label: String,
}

async fn add_data_submit(
    Path(model_id): Path<i64>,
    Form(form): Form<AddDataForm>,
) -> Result<Redirect, WebError> {
    let app = open_app()?;
    let model = fetch_model(&app, model_id)?;
    app.store()
        .add_example(model.id, &form.data_value, &form.label)
        .map_err(|err| classify(err.into()))?;
    Ok(Redirect::to(&format!("/add_data/{model_id}")))
}

async fn train_page(Path(model_id): Path<i64>) -> Result<Html<String>, WebError> {
    let app = open_app()?;
    let model = fetch_model(&app, model_id)?;
    Ok(Html(pages::train(&model, None)))
}

async fn train_submit(Path(model_id): Path<i64>) -> Result<Html<String>, WebError> {
    let app = open_app()?;
    let model = fetch_model(&app, model_id)?;

    // Training is synchronous and can take a while; keep it off the
    // async workers.
    let blocking_app = app.clone();
    let blocking_model = model.clone();
    let outcome = tokio::task::spawn_blocking(move || blocking_app.train_model(&blocking_model))
        .await
        .map_err(|join_error| WebError::Internal(format!("Training task failed: {join_error}")))?;

    let message = match outcome {
        Ok(report) => pages::train_success_message(&model, &report),
        Err(ServiceError::Train(data_error)) => {
            tracing::warn!(model = %model.name, "Training aborted: {data_error}");
            format!(
                "Model '{}' training failed or no data was available: {data_error}",
                model.name
            )
        }
        Err(error) => return Err(classify(error)),
    };
    Ok(Html(pages::train(&model, Some(&message))))
}

async fn predict_page(Path(model_id): Path<i64>) -> Result<Html<String>, WebError> {
    let app = open_app()?;
    let model = fetch_model(&app, model_id)?;
    Ok(Html(pages::predict(&model, &pages::PredictView::Blank)))
}

#[derive(Debug, Deserialize)]
struct PredictForm {
    text: String,
}

async fn predict_submit(
    Path(model_id): Path<i64>,
    Form(form): Form<PredictForm>,
) -> Result<Html<String>, WebError> {
    let app = open_app()?;
    let model = fetch_model(&app, model_id)?;

    let message = match app.predict(&model, &form.text) {
        Ok(outcome) => {
            let html = pages::predict(
                &model,
                &pages::PredictView::Predicted {
                    input_text: &form.text,
                    outcome: &outcome,
                },
            );
            return Ok(Html(html));
        }
        Err(ServiceError::Artifacts(ArtifactError::NotTrained { .. })) => {
            "Model not trained yet.".to_string()
        }
        Err(error) => {
            tracing::error!(model = %model.name, "Prediction failed: {error}");
            format!("Prediction error: {error}")
        }
    };
    Ok(Html(pages::predict(
        &model,
        &pages::PredictView::Message(&message),
    )))
}

#[derive(Debug, Deserialize)]
struct FeedbackForm {
    action: String,
    true_label: Option<String>,
}

async fn feedback_submit(
    Path((prediction_id, model_id)): Path<(i64, i64)>,
    Form(form): Form<FeedbackForm>,
) -> Result<Redirect, WebError> {
    let app = open_app()?;
    let model = fetch_model(&app, model_id)?;

    let verdict = match form.action.as_str() {
        "correct" => FeedbackVerdict::Correct,
        "incorrect" => FeedbackVerdict::Incorrect {
            true_label: form.true_label.unwrap_or_default(),
        },
        _ => return Ok(Redirect::to(&format!("/model/{model_id}"))),
    };
    app.apply_feedback(&model, prediction_id, verdict)
        .map_err(classify)?;
    Ok(Redirect::to(&format!("/model/{model_id}")))
}

async fn download_data(Path(model_id): Path<i64>) -> Result<Response, WebError> {
    let app = open_app()?;
    let model = fetch_model(&app, model_id)?;
    let exported = app.export_dataset(&model).map_err(classify)?;

    let headers = [
        (header::CONTENT_TYPE, crate::export::EXPORT_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", exported.file_name),
        ),
    ];
    Ok((headers, exported.content).into_response())
}

async fn delete_all() -> Result<Redirect, WebError> {
    let app = open_app()?;
    app.store().wipe_all().map_err(|err| classify(err.into()))?;
    tracing::info!("All models, examples and prediction records deleted");
    Ok(Redirect::to("/"))
}
