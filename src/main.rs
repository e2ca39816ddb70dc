//! Entry point for the labelforge web server.

use labelforge::service::App;
use labelforge::{app_dirs, http, logging, settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_or_default()?;
    if let Some(data_dir) = &settings.data_dir {
        app_dirs::set_app_root_override(data_dir.clone());
    }

    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    // Fail fast if the database or model directories cannot be prepared.
    let app = App::open_default()?;
    let models = app.store().list_models()?;
    tracing::info!("Store ready with {} model definition(s)", models.len());

    let addr = settings.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");
    axum::serve(listener, http::router()).await?;
    Ok(())
}
