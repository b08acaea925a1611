//! Device list handler.

use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /api/devices
///
/// Returns the configured device names in configuration order. Every device
/// name doubles as a room name.
#[instrument(skip_all, name = "tg.handlers.devices")]
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.config.devices.clone())
}
