// Common handler utilities - body decoding, validation and trace ids

use axum::{extract::rejection::JsonRejection, Json};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::models::request::non_blank;
use crate::proxy::error::ProxyError;
use crate::proxy::upstream::client::is_valid_model_name;

pub const EMPTY_RESPONSE_MESSAGE: &str =
    "The Gemini API returned an empty response or an unexpected format.";
pub const INVALID_MODEL: &str =
    "Invalid model name: only letters, digits, '.', '_' and '-' are allowed.";

/// Short per-request id used in log lines and audit rows
pub fn new_trace_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &id[..12])
}

/// Decode a JSON body into `T`. Both axum's rejection and a shape mismatch become a
/// validation error so callers always get the JSON envelope.
pub fn parse_body<T: DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<T, ProxyError> {
    let Json(value) =
        body.map_err(|e| ProxyError::Validation(format!("Invalid JSON body: {}", e.body_text())))?;
    serde_json::from_value(value)
        .map_err(|e| ProxyError::Validation(format!("Invalid request body: {}", e)))
}

/// Trimmed value of a required string field
pub fn require<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, ProxyError> {
    non_blank(value).ok_or_else(|| ProxyError::Validation(message.to_string()))
}

/// Reject model ids that could not be a single Gemini resource name
pub fn check_model(model: &str) -> Result<(), ProxyError> {
    if is_valid_model_name(model) {
        Ok(())
    } else {
        Err(ProxyError::Validation(INVALID_MODEL.to_string()))
    }
}

/// Echo of caller options for the `result` block
pub fn echo<T: Serialize>(value: &Option<T>) -> Option<Value> {
    value
        .as_ref()
        .and_then(|v| serde_json::to_value(v).ok())
}
