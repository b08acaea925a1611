//! Token issuance handlers.
//!
//! - `GET /api/token?room=` - viewer token, no upstream check
//! - `GET /api/publisher-token?room=&identity=` - publisher token, admission checked
//!
//! An omitted `room` falls back to the first configured device. An explicitly
//! empty `room` is a client error.

use crate::config::Config;
use crate::errors::GatewayError;
use crate::models::{PublisherTokenQuery, TokenResponse, ViewerTokenQuery};
use crate::routes::AppState;
use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

fn resolve_room<'a>(requested: Option<&'a str>, config: &'a Config) -> Result<&'a str, GatewayError> {
    match requested {
        None => Ok(config.default_room()),
        Some(room) if room.trim().is_empty() => {
            Err(GatewayError::BadRequest("room must not be empty".to_string()))
        }
        Some(room) => Ok(room),
    }
}

/// Handler for GET /api/token
#[instrument(skip_all, name = "tg.handlers.viewer_token", fields(room = ?query.room))]
pub async fn get_viewer_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewerTokenQuery>,
) -> Result<Json<TokenResponse>, GatewayError> {
    let room = resolve_room(query.room.as_deref(), &state.config)?;
    let response = state.issuer.request_viewer_token(room)?;
    Ok(Json(response))
}

/// Handler for GET /api/publisher-token
///
/// # Response
///
/// - 200 with `{identity, token, server_url, room}`
/// - 404 `ROOM_NOT_FOUND` when upstream has no such room
/// - 409 `ROOM_OCCUPIED` when the room already has a publisher
#[instrument(skip_all, name = "tg.handlers.publisher_token", fields(room = ?query.room))]
pub async fn get_publisher_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PublisherTokenQuery>,
) -> Result<Json<TokenResponse>, GatewayError> {
    let room = resolve_room(query.room.as_deref(), &state.config)?;
    let response = state
        .admission
        .request_publisher_token(room, query.identity.as_deref())
        .await?;
    Ok(Json(response))
}
