//! Token Gateway error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Admission rejections (`RoomNotFound`, `RoomOccupied`) are user-facing and
//! carry remediation advice. Everything else collapses to a generic message;
//! the actual cause is logged server-side.

use crate::services::token_issuer::SigningError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Token Gateway error type.
///
/// Maps to HTTP status codes:
/// - RoomNotFound: 404 Not Found
/// - RoomOccupied: 409 Conflict
/// - BadRequest: 400 Bad Request
/// - Signing, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The requested room is not known to the upstream registry.
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// The requested room already has an active publisher.
    #[error("Room occupied: {0}")]
    RoomOccupied(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Token signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::RoomNotFound(_) => 404,
            GatewayError::RoomOccupied(_) => 409,
            GatewayError::BadRequest(_) => 400,
            GatewayError::Signing(_) | GatewayError::Internal(_) => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GatewayError::RoomNotFound(room) => (
                StatusCode::NOT_FOUND,
                "ROOM_NOT_FOUND",
                format!(
                    "Room {} does not exist, please check that the device name is correct",
                    room
                ),
            ),
            GatewayError::RoomOccupied(room) => (
                StatusCode::CONFLICT,
                "ROOM_OCCUPIED",
                format!(
                    "Room {} already has an active publisher, please try again later or choose another device",
                    room
                ),
            ),
            GatewayError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            GatewayError::Signing(err) => {
                tracing::error!(target: "tg.signing", error = %err, "Token signing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TOKEN_SIGNING_FAILED",
                    "Failed to generate token".to_string(),
                )
            }
            GatewayError::Internal(reason) => {
                tracing::error!(target: "tg.internal", reason = %reason, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
