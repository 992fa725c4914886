//! Normalized response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// Message used when upstream sent neither JSON nor any text.
pub const EMPTY_BODY_FALLBACK: &str = "No response body";

/// The `{status, body}` pair returned to the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: StatusCode,
    pub body: Value,
}

impl Envelope {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// `{"error": message}` with the given status.
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::new(status, json!({ "error": message }))
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Interpret upstream text as JSON, or wrap it as `{"message": ..}`.
///
/// Never fails: blank text becomes `fallback`.
pub fn normalize_body(raw_text: &str, fallback: &str) -> Value {
    match serde_json::from_str::<Value>(raw_text) {
        Ok(value) => value,
        Err(_) => {
            let message = if raw_text.trim().is_empty() {
                fallback
            } else {
                raw_text
            };
            json!({ "message": message })
        }
    }
}
