//! HTTP handlers and the shared JSON error envelope.

pub mod generate;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Body returned when even the error payload cannot be serialised.
pub const FALLBACK_ERROR_BODY: &[u8] = br#"{"error":"internal error"}"#;

/// The only structured payload returned on failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub error: &'a str,
}

/// Serialise an error message, falling back to a static payload.
pub fn error_body(message: &str) -> Vec<u8> {
    serde_json::to_vec(&ErrorResponse { error: message }).unwrap_or_else(|e| {
        tracing::error!("Could not serialise error response: {e}");
        FALLBACK_ERROR_BODY.to_vec()
    })
}

/// Standard error response.
pub fn err_json(status: u16, message: &str) -> Response {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, "application/json")],
        error_body(message),
    )
        .into_response()
}
