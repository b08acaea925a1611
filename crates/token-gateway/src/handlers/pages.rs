//! Front-end page handlers.
//!
//! Pages are read from the templates directory on every request so that
//! front-end edits show up without a restart. A missing page is not an
//! error: a short placeholder is served with 200 instead.

use crate::routes::AppState;
use axum::extract::State;
use axum::response::Html;
use std::path::Path;
use std::sync::Arc;
use tracing::{instrument, warn};

const PUBLISHER_PAGE: &str = "index.html";
const VIEWER_PAGE: &str = "test.html";

const PUBLISHER_FALLBACK: &str =
    "<h1>Publisher page not found</h1><p>Make sure templates/index.html exists</p>";
const VIEWER_FALLBACK: &str =
    "<h1>Viewer page not found</h1><p>Make sure templates/test.html exists</p>";

async fn render_page(templates_dir: &str, file: &str, fallback: &'static str) -> Html<String> {
    let path = Path::new(templates_dir).join(file);

    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => Html(contents),
        Err(e) => {
            warn!(
                target: "tg.handlers.pages",
                path = %path.display(),
                error = %e,
                "Page not available, serving fallback"
            );
            Html(fallback.to_string())
        }
    }
}

/// Handler for GET / (publisher page)
#[instrument(skip_all, name = "tg.handlers.publisher_page")]
pub async fn publisher_page(State(state): State<Arc<AppState>>) -> Html<String> {
    render_page(&state.config.templates_dir, PUBLISHER_PAGE, PUBLISHER_FALLBACK).await
}

/// Handler for GET /test (viewer page)
#[instrument(skip_all, name = "tg.handlers.viewer_page")]
pub async fn viewer_page(State(state): State<Arc<AppState>>) -> Html<String> {
    render_page(&state.config.templates_dir, VIEWER_PAGE, VIEWER_FALLBACK).await
}
